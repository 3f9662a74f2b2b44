//! Host surfaces: the ports the engine drives.
//!
//! The engine never touches a DOM, a WebGL context, or a filesystem
//! directly. Embedders supply four surfaces and the engine stays generic
//! over them:
//!
//! | Surface | Role |
//! |---------|------|
//! | [`AutomationSurface`] | Enumerate, click, and scroll configurator controls |
//! | [`ViewerSurface`] | Grab frames and toggle presentation modes |
//! | [`KeyValueStore`] | Persist resume snapshots |
//! | [`FileDelivery`] | Hand finished images to the host |
//!
//! [`MemoryStore`] and [`DirectoryDelivery`] are shipped implementations
//! of the last two; the first two are always host-provided.

// ============================================================================
// Modules
// ============================================================================

mod automation;
mod delivery;
mod store;
mod viewer;

#[cfg(test)]
pub(crate) mod fake;

// ============================================================================
// Re-exports
// ============================================================================

pub use automation::{AutomationSurface, ControlHandle, ScrollRegion, ScrollState};
pub use delivery::{DirectoryDelivery, FileDelivery};
pub use store::{KeyValueStore, MemoryStore};
pub use viewer::{BackgroundSpec, Capability, RawFrame, ViewerSurface};
