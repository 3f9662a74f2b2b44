//! Error types for the capture engine.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use configurator_capture::{Result, Error};
//!
//! async fn example(engine: &CaptureEngine) -> Result<()> {
//!     let groups = engine.scan().await?;
//!     println!("{} groups", groups.len());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Scanning | [`Error::Enumeration`], [`Error::ControlNotFound`] |
//! | Planning | [`Error::Plan`], [`Error::IndexOutOfRange`] |
//! | Capture | [`Error::Capture`], [`Error::Timeout`] |
//! | Batch | [`Error::InvalidTransition`] |
//! | Host surfaces | [`Error::Surface`], [`Error::Store`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::batch::BatchStatus;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the engine is built or configured incorrectly.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Scanning Errors
    // ========================================================================
    /// Option enumeration found nothing usable.
    ///
    /// Returned when the configurator page exposes no option groups.
    #[error("Enumeration failed: {message}")]
    Enumeration {
        /// Description of the enumeration failure.
        message: String,
    },

    /// A named control could not be located.
    ///
    /// Returned when a group or value control is not found even after
    /// scrolling through the containing list.
    #[error("Control not found: {label} (in {scope})")]
    ControlNotFound {
        /// Normalized label that was searched for.
        label: String,
        /// Which list was searched (`groups`, `values`, `navigation`).
        scope: String,
    },

    // ========================================================================
    // Planning Errors
    // ========================================================================
    /// Batch plan validation error.
    ///
    /// Returned when a selection set cannot produce a valid plan.
    #[error("Plan error: {message}")]
    Plan {
        /// Description of the plan error.
        message: String,
    },

    /// Combination index outside the plan's range.
    #[error("Index {index} out of range (total {total})")]
    IndexOutOfRange {
        /// The requested index.
        index: u64,
        /// Total combinations in the plan.
        total: u64,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Frame capture or processing error.
    ///
    /// Returned when the viewer yields no usable frame.
    #[error("Capture error: {message}")]
    Capture {
        /// Description of the capture failure.
        message: String,
    },

    /// Operation timeout.
    ///
    /// Returned when an operation exceeds its timeout duration.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Batch Errors
    // ========================================================================
    /// Batch control action invalid in the current status.
    #[error("Cannot {action} while {status}")]
    InvalidTransition {
        /// The attempted action (`start`, `pause`, ...).
        action: String,
        /// Status the controller was in.
        status: BatchStatus,
    },

    // ========================================================================
    // Host Surface Errors
    // ========================================================================
    /// Automation or viewer surface failure.
    ///
    /// Returned when a host-provided surface reports an error.
    #[error("Surface error: {message}")]
    Surface {
        /// Description of the surface failure.
        message: String,
    },

    /// Persistence store failure.
    #[error("Store error: {message}")]
    Store {
        /// Description of the store failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an enumeration error.
    #[inline]
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration {
            message: message.into(),
        }
    }

    /// Creates a control not found error.
    #[inline]
    pub fn control_not_found(label: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::ControlNotFound {
            label: label.into(),
            scope: scope.into(),
        }
    }

    /// Creates a plan error.
    #[inline]
    pub fn plan(message: impl Into<String>) -> Self {
        Self::Plan {
            message: message.into(),
        }
    }

    /// Creates an index out of range error.
    #[inline]
    pub fn index_out_of_range(index: u64, total: u64) -> Self {
        Self::IndexOutOfRange { index, total }
    }

    /// Creates a capture error.
    #[inline]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates an invalid transition error.
    #[inline]
    pub fn invalid_transition(action: impl Into<String>, status: BatchStatus) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            status,
        }
    }

    /// Creates a surface error.
    #[inline]
    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface {
            message: message.into(),
        }
    }

    /// Creates a store error.
    #[inline]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a planning error.
    #[inline]
    #[must_use]
    pub fn is_plan_error(&self) -> bool {
        matches!(self, Self::Plan { .. } | Self::IndexOutOfRange { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors fail a single batch item; the batch itself
    /// carries on with the next combination.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ControlNotFound { .. }
                | Self::Capture { .. }
                | Self::Timeout { .. }
                | Self::Surface { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
