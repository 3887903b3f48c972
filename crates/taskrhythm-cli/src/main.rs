use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "taskrhythm", version, about = "Energy-aware task scheduling")]
struct Cli {
    /// Act as this user (defaults to `user.default_user`)
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Database file (defaults to `storage.database`, then the data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log scheduling decisions to stderr
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Energy window management
    Window {
        #[command(subcommand)]
        action: commands::window::WindowAction,
    },
    /// Run, clear or inspect the schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // stdout carries command output (and --json), logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = commands::Context::load(cli.user, cli.db).and_then(|ctx| match cli.command {
        Commands::Task { action } => commands::task::run(&ctx, action),
        Commands::Window { action } => commands::window::run(&ctx, action),
        Commands::Schedule { action } => commands::schedule::run(&ctx, action),
        Commands::Config { action } => commands::config::run(ctx, action),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
