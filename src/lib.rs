//! Configurator Capture - Batch product image capture engine.
//!
//! This library enumerates the option groups of a product configurator
//! UI, freezes a selection of them into a batch plan, and captures one
//! viewer image per combination of option values.
//!
//! # Architecture
//!
//! The engine never touches a DOM, a render context, or a filesystem
//! directly. Embedders provide four host surfaces and the engine drives
//! the workflow through them:
//!
//! - [`AutomationSurface`]: enumerate, click, and scroll UI controls
//! - [`ViewerSurface`]: grab frames and toggle presentation modes
//! - [`KeyValueStore`]: persist resume snapshots across sessions
//! - [`FileDelivery`]: hand finished PNGs to the host
//!
//! Key design principles:
//!
//! - Labels are matched after normalization (diacritics folded,
//!   whitespace collapsed, lowercased), so UI text survives restyling
//! - The combination space is indexed lazily in mixed-radix order and
//!   never materialized, however large the product
//! - Consecutive combinations are applied as diffs: only groups whose
//!   value changed are touched
//! - The batch worker is cooperative: pause, resume, and stop land on
//!   item boundaries, and every item persists a resume snapshot
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use configurator_capture::{CaptureEngine, MemoryStore, Result, SelectionSet};
//! # use configurator_capture::{AutomationSurface, FileDelivery, ViewerSurface};
//!
//! # async fn example(
//! #     automation: Arc<dyn AutomationSurface>,
//! #     viewer: Arc<dyn ViewerSurface>,
//! #     delivery: Arc<dyn FileDelivery>,
//! # ) -> Result<()> {
//! let engine = CaptureEngine::builder()
//!     .automation(automation)
//!     .viewer(viewer)
//!     .delivery(delivery)
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//!
//! // Enumerate what the configurator offers
//! let groups = engine.scan().await?;
//!
//! // Capture every combination across all groups
//! let selection = (0..groups.len())
//!     .fold(SelectionSet::new(), |set, index| set.with_group(index));
//! let plan = engine.build_plan(&selection).await?;
//!
//! engine.start(plan).await?;
//! engine.wait_until_terminal().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Batch lifecycle: status, progress, events |
//! | [`capture`] | Frame grabbing, blank detection, PNG production |
//! | [`engine`] | Engine facade, builder, and options |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`label`] | Label normalization and filename sanitization |
//! | [`plan`] | Combination space modeling, indexing, and diffing |
//! | [`resume`] | Resume snapshot persistence |
//! | [`surface`] | Host surface traits and shipped implementations |
//!
//! # Features
//!
//! - **Lazy combination space**: mixed-radix indexing over the plan, the
//!   Cartesian product is never held in memory
//! - **Minimal UI churn**: items apply only the groups that changed
//!   since the previous combination
//! - **Blank-proof captures**: render stabilization, boosted
//!   presentation with retry, plain-grab fallback
//! - **Interruptible batches**: pause, resume, stop, and cross-session
//!   resume keyed by page address

// ============================================================================
// Modules
// ============================================================================

/// Batch lifecycle: status, progress counters, and the event stream.
///
/// The worker loop itself is internal; it is driven through
/// [`CaptureEngine`].
pub mod batch;

/// Frame capture pipeline.
///
/// Turns raw viewer frames into delivery-ready PNGs with blank
/// detection and boosted-presentation handling.
pub mod capture;

/// Engine facade and configuration.
///
/// Use [`CaptureEngine::builder()`] to wire host surfaces into an
/// engine instance.
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Label normalization and filename sanitization.
pub mod label;

/// Batch planning: scan results, selections, plans, and combinations.
pub mod plan;

/// Resume snapshot persistence keyed by canonical page address.
pub mod resume;

/// Host surface traits the engine is generic over.
pub mod surface;

/// Configurator UI traversal: scanning and selection application.
mod configurator;

/// Async polling helpers.
mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Engine types
pub use engine::{CaptureEngine, CaptureEngineBuilder, EngineOptions};

// Batch types
pub use batch::{BatchEvent, BatchProgress, BatchStatus, EventHandler, FailedItem};

// Plan types
pub use plan::{
    BatchPlan, Combination, OptionGroup, OptionValue, PlanGroup, PlanMeta, PlanValue, Selection,
    SelectionSet,
};

// Capture types
pub use capture::{CapturePipeline, CapturedImage};

// Resume types
pub use resume::{ResumeSnapshot, ResumeStore};

// Surface types
pub use surface::{
    AutomationSurface, BackgroundSpec, Capability, ControlHandle, DirectoryDelivery, FileDelivery,
    KeyValueStore, MemoryStore, RawFrame, ScrollRegion, ScrollState, ViewerSurface,
};

// Error types
pub use error::{Error, Result};
