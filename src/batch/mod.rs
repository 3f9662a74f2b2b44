//! Batch execution: lifecycle, progress, events, and filenames.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`BatchController`] | Pausable worker loop over a plan's combinations |
//! | [`BatchStatus`] / [`BatchProgress`] | Lifecycle state and run counters |
//! | [`BatchEvent`] / [`EventHandler`] | Synchronous notification stream |

// ============================================================================
// Modules
// ============================================================================

mod controller;
mod events;
mod filename;
mod progress;

// ============================================================================
// Re-exports
// ============================================================================

pub use events::{BatchEvent, EventHandler};
pub use progress::{BatchProgress, BatchStatus, FailedItem};

pub(crate) use controller::BatchController;
