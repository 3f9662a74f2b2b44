//! Capture engine coordinator.
//!
//! The [`CaptureEngine`] struct is the crate's front door. It owns the
//! scanner, the batch controller, and the resume store, and exposes the
//! scan / plan / run workflow to embedders.
//!
//! # Example
//!
//! ```no_run
//! use configurator_capture::{CaptureEngine, SelectionSet};
//!
//! # async fn example(engine: &CaptureEngine) -> configurator_capture::Result<()> {
//! let groups = engine.scan().await?;
//! let selection = (0..groups.len())
//!     .fold(SelectionSet::new(), |set, index| set.with_group(index));
//!
//! let plan = engine.build_plan(&selection).await?;
//! engine.start(plan).await?;
//! engine.wait_until_terminal().await;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::batch::{BatchController, BatchProgress, BatchStatus, EventHandler};
use crate::configurator::OptionScanner;
use crate::error::Result;
use crate::plan::{BatchPlan, OptionGroup, PlanMeta, SelectionSet};
use crate::resume::{ResumeSnapshot, ResumeStore};
use crate::surface::{AutomationSurface, FileDelivery, KeyValueStore, ViewerSurface};

use super::builder::CaptureEngineBuilder;
use super::options::EngineOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the engine.
pub(crate) struct EngineInner {
    /// Configurator UI automation surface.
    automation: Arc<dyn AutomationSurface>,

    /// Effective engine options.
    options: Arc<EngineOptions>,

    /// Option tree enumerator.
    scanner: OptionScanner,

    /// Batch lifecycle and worker loop.
    controller: BatchController,

    /// Resume snapshot persistence.
    resume: ResumeStore,

    /// Most recent scan result, if any.
    scanned: Mutex<Option<Vec<OptionGroup>>>,
}

// ============================================================================
// CaptureEngine
// ============================================================================

/// Batch configuration capture coordinator.
///
/// The engine is responsible for:
/// - Enumerating option groups and values from the configurator
/// - Freezing selections into batch plans
/// - Running, pausing, and resuming batch captures
///
/// Cheap to clone; all clones share one engine.
#[derive(Clone)]
pub struct CaptureEngine {
    /// Shared inner state.
    pub(crate) inner: Arc<EngineInner>,
}

// ============================================================================
// CaptureEngine - Display
// ============================================================================

impl fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("status", &self.status())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CaptureEngine - Public API
// ============================================================================

impl CaptureEngine {
    /// Creates a configuration builder for the engine.
    #[inline]
    #[must_use]
    pub fn builder() -> CaptureEngineBuilder {
        CaptureEngineBuilder::new()
    }

    /// Effective engine options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    // ------------------------------------------------------------------
    // Scanning and planning
    // ------------------------------------------------------------------

    /// Enumerates option groups and their values from the configurator.
    ///
    /// Walks the group list, opens every group, and collects its
    /// selectable values. The result is cached for [`build_plan`] and
    /// [`cached_scan`]; calling `scan` again refreshes the cache.
    ///
    /// [`build_plan`]: CaptureEngine::build_plan
    /// [`cached_scan`]: CaptureEngine::cached_scan
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enumeration`](crate::Error::Enumeration) when the
    /// page exposes no option groups, or a surface error when the UI
    /// cannot be driven.
    pub async fn scan(&self) -> Result<Vec<OptionGroup>> {
        let groups = self.inner.scanner.scan().await?;
        *self.inner.scanned.lock() = Some(groups.clone());
        Ok(groups)
    }

    /// The cached scan result, without touching the UI.
    #[must_use]
    pub fn cached_scan(&self) -> Option<Vec<OptionGroup>> {
        self.inner.scanned.lock().clone()
    }

    /// Freezes a selection into a batch plan.
    ///
    /// Scans first when no cached scan exists. The plan embeds the page
    /// address, the product name, and the configured capture size, so it
    /// stays valid across sessions.
    ///
    /// # Errors
    ///
    /// Returns a scan error when enumeration is needed and fails, or
    /// [`Error::Plan`](crate::Error::Plan) when the selection is invalid.
    pub async fn build_plan(&self, selection: &SelectionSet) -> Result<BatchPlan> {
        let groups = match self.cached_scan() {
            Some(groups) => groups,
            None => self.scan().await?,
        };

        let source_address = self.inner.automation.page_address().await?;
        let product_name = self.inner.automation.product_title().await?;
        BatchPlan::build(
            &groups,
            selection,
            PlanMeta {
                source_address,
                product_name,
                capture_width: self.inner.options.capture_width,
                capture_height: self.inner.options.capture_height,
            },
        )
    }

    // ------------------------------------------------------------------
    // Batch lifecycle
    // ------------------------------------------------------------------

    /// Starts a batch run over `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// while a run is active.
    pub async fn start(&self, plan: BatchPlan) -> Result<()> {
        info!(
            total_images = plan.total_images,
            groups = plan.groups.len(),
            "Starting batch run"
        );
        self.inner.controller.start(Arc::new(plan)).await
    }

    /// Pauses the run between items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// unless the run is running.
    pub async fn pause(&self) -> Result<()> {
        self.inner.controller.pause().await
    }

    /// Resumes a paused run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// unless the run is paused.
    pub async fn resume(&self) -> Result<()> {
        self.inner.controller.resume().await
    }

    /// Stops the run on the next item boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// unless the run is running or paused.
    pub async fn stop(&self) -> Result<()> {
        self.inner.controller.stop().await
    }

    /// Re-runs the loaded plan from the beginning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// while a run is active, or [`Error::Plan`](crate::Error::Plan) when
    /// no plan has been loaded yet.
    pub async fn restart(&self) -> Result<()> {
        self.inner.controller.restart().await
    }

    /// Current lifecycle state.
    #[inline]
    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.inner.controller.status()
    }

    /// Snapshot of the run counters.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> BatchProgress {
        self.inner.controller.progress()
    }

    /// Registers the event callback, replacing any previous one.
    pub fn set_event_handler(&self, handler: EventHandler) {
        self.inner.controller.set_event_handler(handler);
    }

    /// Removes the event callback.
    pub fn clear_event_handler(&self) {
        self.inner.controller.clear_event_handler();
    }

    /// Waits for the worker task to finish.
    ///
    /// Returns immediately when no run is in flight. A paused run never
    /// finishes on its own; resume or stop it first.
    pub async fn wait_until_terminal(&self) {
        self.inner.controller.wait_until_terminal().await;
    }

    // ------------------------------------------------------------------
    // Resume snapshots
    // ------------------------------------------------------------------

    /// Loads the resume snapshot persisted for the current page, if any.
    ///
    /// Undecodable or foreign snapshots read as `None` rather than
    /// failing.
    ///
    /// # Errors
    ///
    /// Returns a surface or store error when the page address or the
    /// store cannot be read.
    pub async fn load_resume_snapshot(&self) -> Result<Option<ResumeSnapshot>> {
        let address = self.inner.automation.page_address().await?;
        self.inner.resume.load(&address).await
    }

    /// Continues an interrupted run from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`](crate::Error::InvalidTransition)
    /// while a run is active.
    pub async fn resume_from_snapshot(&self, snapshot: ResumeSnapshot) -> Result<()> {
        self.inner.controller.resume_from(snapshot).await
    }

    /// Deletes the resume snapshot persisted for the current page.
    ///
    /// # Errors
    ///
    /// Returns a surface or store error when the page address or the
    /// store cannot be written.
    pub async fn clear_resume(&self) -> Result<()> {
        let address = self.inner.automation.page_address().await?;
        self.inner.resume.clear(&address).await
    }
}

// ============================================================================
// CaptureEngine - Internal API
// ============================================================================

impl CaptureEngine {
    /// Creates a new engine over the given surfaces.
    pub(crate) fn new(
        automation: Arc<dyn AutomationSurface>,
        viewer: Arc<dyn ViewerSurface>,
        delivery: Arc<dyn FileDelivery>,
        store: Arc<dyn KeyValueStore>,
        options: EngineOptions,
    ) -> Self {
        let options = Arc::new(options);
        let scanner = OptionScanner::new(automation.clone(), options.clone());
        let controller = BatchController::new(
            automation.clone(),
            viewer,
            delivery,
            store.clone(),
            options.clone(),
        );
        let resume = ResumeStore::new(store);

        debug!(
            capture_width = options.capture_width,
            capture_height = options.capture_height,
            "Capture engine initialized"
        );

        Self {
            inner: Arc::new(EngineInner {
                automation,
                options,
                scanner,
                controller,
                resume,
                scanned: Mutex::new(None),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
