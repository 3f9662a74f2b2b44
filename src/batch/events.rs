//! Batch run event stream.
//!
//! Event delivery is synchronous and best effort: the run loop invokes
//! the registered handler inline between items, so handlers must be
//! fast and must not block.

// ============================================================================
// Imports
// ============================================================================

use super::progress::{BatchProgress, BatchStatus};

// ============================================================================
// Events
// ============================================================================

/// Callback invoked for every [`BatchEvent`].
pub type EventHandler = Box<dyn Fn(BatchEvent) + Send + Sync>;

/// Notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The lifecycle state changed.
    StatusChanged {
        /// New state.
        status: BatchStatus,
    },
    /// One combination was captured and delivered.
    ItemCompleted {
        /// Combination index.
        index: u64,
        /// Delivered filename.
        filename: String,
        /// Delivered size in bytes.
        bytes: u64,
    },
    /// One combination exhausted its attempts.
    ItemFailed {
        /// Combination index.
        index: u64,
        /// Final failure reason.
        error: String,
    },
    /// A capture attempt failed; more attempts may follow.
    AttemptFailed {
        /// Combination index.
        index: u64,
        /// 1-based attempt number.
        attempt: u32,
        /// Attempt budget for this item.
        max_attempts: u32,
        /// Failure reason.
        error: String,
    },
    /// Progress counters after an item settled.
    Progress {
        /// Snapshot of the run counters.
        progress: BatchProgress,
    },
    /// Every combination was processed.
    Finished {
        /// Successfully delivered images.
        completed: u64,
        /// Failed combinations.
        failed: u64,
    },
}

// ============================================================================
// Tests
// ============================================================================
