//! Engine assembly: options, builder, and the coordinator facade.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`EngineOptions`] | Tuning knobs with production defaults |
//! | [`CaptureEngineBuilder`] | Wires host surfaces into an engine |
//! | [`CaptureEngine`] | Scan / plan / run front door |

// ============================================================================
// Modules
// ============================================================================

mod builder;
mod core;
mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CaptureEngineBuilder;
pub use core::CaptureEngine;
pub use options::EngineOptions;
