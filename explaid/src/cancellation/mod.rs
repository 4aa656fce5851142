//! Structured cancellation utilities.
//!
//! This module provides:
//! - `CancellationToken` for cooperative cancellation
//! - `SupervisedTask` for background tasks that must be signalled and joined

mod supervised;
mod token;

pub use supervised::SupervisedTask;
pub use token::CancellationToken;
