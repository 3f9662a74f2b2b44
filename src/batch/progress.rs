//! Batch lifecycle states and progress accounting.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Most failed items kept with full detail; the failure count keeps
/// growing past this.
const MAX_FAILED_ITEMS: usize = 200;

// ============================================================================
// Batch Status
// ============================================================================

/// Lifecycle state of a batch run.
///
/// ```text
/// Idle -> Running <-> Paused
///            |           |
///            +-> Stopping +-> Stopped
///            |
///            +-> Completed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// No run has been started.
    Idle,
    /// The run loop is processing combinations.
    Running,
    /// Paused between items; resumable.
    Paused,
    /// Stop requested; the loop is winding down.
    Stopping,
    /// Stopped before finishing; resumable from a snapshot.
    Stopped,
    /// Every combination was processed.
    Completed,
}

impl BatchStatus {
    /// Returns `true` once the run can no longer make progress.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }

    /// Returns `true` while a worker owns the run.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Stopping)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Failed Item
// ============================================================================

/// One combination that exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    /// Combination index within the plan.
    pub index: u64,
    /// Human-readable failure reason.
    pub error: String,
    /// Value labels of the combination, in group order.
    pub labels: Vec<String>,
}

// ============================================================================
// Batch Progress
// ============================================================================

/// Counters for one batch run.
///
/// `current_index` is the next combination to process; indices below it
/// are settled as either completed or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Next combination index to process.
    pub current_index: u64,
    /// Total combinations in the plan.
    pub total_images: u64,
    /// Successfully delivered images.
    pub completed_count: u64,
    /// Combinations that exhausted their attempts.
    pub failed_count: u64,
    /// Total bytes delivered so far.
    pub downloaded_bytes: u64,
    /// Detailed failures, capped at [`MAX_FAILED_ITEMS`].
    pub failed_items: Vec<FailedItem>,
}

impl BatchProgress {
    /// Fresh progress for a plan of `total_images` combinations.
    #[must_use]
    pub fn new(total_images: u64) -> Self {
        Self {
            current_index: 0,
            total_images,
            completed_count: 0,
            failed_count: 0,
            downloaded_bytes: 0,
            failed_items: Vec::new(),
        }
    }

    /// Records a delivered image.
    pub fn record_success(&mut self, bytes: u64) {
        self.completed_count += 1;
        self.downloaded_bytes += bytes;
    }

    /// Records a failed combination, keeping detail for the first
    /// [`MAX_FAILED_ITEMS`].
    pub fn record_failure(&mut self, item: FailedItem) {
        self.failed_count += 1;
        if self.failed_items.len() < MAX_FAILED_ITEMS {
            self.failed_items.push(item);
        }
    }

    /// Moves on to the next combination.
    pub fn advance(&mut self) {
        self.current_index += 1;
    }

    /// Returns `true` once every combination has been processed.
    #[inline]
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.current_index >= self.total_images
    }

    /// Combinations not yet processed.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total_images.saturating_sub(self.current_index)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_lowercase() {
        assert_eq!(BatchStatus::Idle.to_string(), "idle");
        assert_eq!(BatchStatus::Running.to_string(), "running");
        assert_eq!(BatchStatus::Stopping.to_string(), "stopping");
        assert_eq!(BatchStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_status_predicates() {
        assert!(BatchStatus::Stopped.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(!BatchStatus::Paused.is_terminal());
        assert!(BatchStatus::Running.is_active());
        assert!(BatchStatus::Paused.is_active());
        assert!(BatchStatus::Stopping.is_active());
        assert!(!BatchStatus::Idle.is_active());
        assert!(!BatchStatus::Completed.is_active());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&BatchStatus::Paused).unwrap();
        assert_eq!(json, "\"paused\"");
        let back: BatchStatus = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(back, BatchStatus::Stopped);
    }

    #[test]
    fn test_progress_counters() {
        let mut progress = BatchProgress::new(4);
        assert_eq!(progress.remaining(), 4);
        assert!(!progress.is_done());

        progress.record_success(1000);
        progress.advance();
        progress.record_failure(FailedItem {
            index: 1,
            error: "frame looks blank".to_string(),
            labels: vec!["Rouge".to_string()],
        });
        progress.advance();

        assert_eq!(progress.completed_count, 1);
        assert_eq!(progress.failed_count, 1);
        assert_eq!(progress.downloaded_bytes, 1000);
        assert_eq!(progress.current_index, 2);
        assert_eq!(progress.remaining(), 2);
    }

    #[test]
    fn test_progress_failure_detail_is_bounded() {
        let mut progress = BatchProgress::new(1000);
        for index in 0..(MAX_FAILED_ITEMS as u64 + 25) {
            progress.record_failure(FailedItem {
                index,
                error: "x".to_string(),
                labels: Vec::new(),
            });
        }

        assert_eq!(progress.failed_count, MAX_FAILED_ITEMS as u64 + 25);
        assert_eq!(progress.failed_items.len(), MAX_FAILED_ITEMS);
    }

    #[test]
    fn test_progress_serde_roundtrip() {
        let mut progress = BatchProgress::new(6);
        progress.record_success(2048);
        progress.advance();

        let json = serde_json::to_string(&progress).unwrap();
        let back: BatchProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }
}
