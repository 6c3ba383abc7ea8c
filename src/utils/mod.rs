//! Utility modules for SignalPilot

pub mod errors;
pub mod helpers;
pub mod logging;

pub use errors::{Result, SignalPilotError};
