//! # TaskRhythm Core Library
//!
//! Energy-aware task scheduling. Users describe recurring weekly energy
//! windows (high, medium, low) and a backlog of tasks with an effort level;
//! a scheduling pass assigns each task to the first window whose energy
//! suits its effort and whose remaining capacity fits its duration.
//!
//! ## Architecture
//!
//! - **Scheduler**: capacity accounting, effort/energy matching and the
//!   batch pass, written against the [`ScheduleStore`] port
//! - **Storage**: SQLite adapter with immediate transactions, an in-memory
//!   adapter, and TOML configuration
//! - **View**: read-only grouping of windows and tasks for display
//!
//! ## Key Components
//!
//! - [`SchedulingEngine`]: runs a pass inside a caller-supplied transaction
//! - [`ScheduleDb`]: task and window persistence
//! - [`Config`]: application configuration management

pub mod energy;
pub mod error;
pub mod parse;
pub mod scheduler;
pub mod storage;
pub mod task;
pub mod view;

pub use energy::{EnergyLevel, EnergyWindow, NewWindow, WindowId, WindowUpdate};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use scheduler::{
    clear_schedule, Assignment, BacklogOrder, EffortEnergyMatcher, PassOutcome, SchedulerConfig,
    SchedulingEngine,
};
pub use storage::{Config, MemoryStore, ScheduleDb, ScheduleStore, ScheduleTx};
pub use task::{EffortLevel, NewTask, Task, TaskId, TaskUpdate, UserId};
pub use view::{MessageKind, ScheduleView, WindowSlot};
