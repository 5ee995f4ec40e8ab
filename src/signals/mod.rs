//! Signal bus: named lifecycle checkpoints.
//!
//! ## Contents
//! - [`Signal`] checkpoint names
//! - [`Signals`] settle-once checkpoint map with resettable slots

mod checkpoints;
mod signal;

pub use checkpoints::Signals;
pub use signal::Signal;
