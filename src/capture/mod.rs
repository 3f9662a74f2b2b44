//! Capture pipeline: frame grabbing, analysis, and PNG production.
//!
//! The pipeline wraps a [`ViewerSurface`](crate::surface::ViewerSurface)
//! and turns raw frames into delivery-ready PNGs. It owns the blank-frame
//! heuristics, the boosted-presentation flow with its in-boost retry and
//! plain fallback, and the render stabilization wait.

// ============================================================================
// Modules
// ============================================================================

mod frame;
mod pipeline;

// ============================================================================
// Re-exports
// ============================================================================

pub use pipeline::{CapturePipeline, CapturedImage};

pub(crate) use frame::is_likely_blank;
