//! Energy windows.
//!
//! Recurring weekly time slots, each tagged with the energy level its owner
//! usually has during that slot.

mod window;

pub use window::{EnergyLevel, EnergyWindow, NewWindow, WindowId, WindowUpdate};
