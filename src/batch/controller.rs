//! Batch run loop and lifecycle control.
//!
//! One worker task walks the combination index in order. Per item it
//! decodes the combination, applies the diff against what the panel
//! already shows, waits for the render to settle, captures with a
//! bounded retry budget, and delivers the image. Control methods flip
//! cooperative flags; the worker polls them between items, so pause and
//! stop always land on an item boundary.
//!
//! A failed item never halts the run: it is recorded, the applied
//! baseline is dropped so the next item re-applies everything, and the
//! loop moves on. Resume snapshots persist after every item and on each
//! lifecycle transition.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{CapturePipeline, CapturedImage};
use crate::configurator::SelectionApplier;
use crate::engine::EngineOptions;
use crate::error::{Error, Result};
use crate::plan::{AppliedCombination, BatchPlan, Combination, combination_for_index, diff_actions};
use crate::resume::{ResumeSnapshot, ResumeStore};
use crate::surface::{AutomationSurface, FileDelivery, KeyValueStore, ViewerSurface};

use super::events::{BatchEvent, EventHandler};
use super::filename::item_filename;
use super::progress::{BatchProgress, BatchStatus, FailedItem};

// ============================================================================
// Types
// ============================================================================

/// Mutable run state behind the controller lock.
struct RunState {
    status: BatchStatus,
    plan: Option<Arc<BatchPlan>>,
    progress: BatchProgress,
    applied: Option<AppliedCombination>,
    worker: Option<JoinHandle<()>>,
}

/// Shared core between the controller handle and its worker task.
struct ControllerInner {
    applier: SelectionApplier,
    pipeline: CapturePipeline,
    delivery: Arc<dyn FileDelivery>,
    resume: ResumeStore,
    options: Arc<EngineOptions>,
    state: Mutex<RunState>,
    paused: AtomicBool,
    halt: AtomicBool,
    handler: Mutex<Option<EventHandler>>,
}

/// One delivered item.
struct ItemSuccess {
    combination: Combination,
    filename: String,
    bytes: u64,
}

/// One item that exhausted its chances.
struct ItemFailure {
    labels: Vec<String>,
    error: Error,
}

// ============================================================================
// Batch Controller
// ============================================================================

/// Runs batch plans over the configured surfaces.
///
/// Cheap to clone; all clones share one run.
#[derive(Clone)]
pub(crate) struct BatchController {
    inner: Arc<ControllerInner>,
}

impl BatchController {
    pub fn new(
        automation: Arc<dyn AutomationSurface>,
        viewer: Arc<dyn ViewerSurface>,
        delivery: Arc<dyn FileDelivery>,
        store: Arc<dyn KeyValueStore>,
        options: Arc<EngineOptions>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                applier: SelectionApplier::new(automation, options.clone()),
                pipeline: CapturePipeline::new(viewer, options.clone()),
                delivery,
                resume: ResumeStore::new(store),
                options,
                state: Mutex::new(RunState {
                    status: BatchStatus::Idle,
                    plan: None,
                    progress: BatchProgress::new(0),
                    applied: None,
                    worker: None,
                }),
                paused: AtomicBool::new(false),
                halt: AtomicBool::new(false),
                handler: Mutex::new(None),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Starts a fresh run over `plan`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a run is active.
    pub async fn start(&self, plan: Arc<BatchPlan>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status.is_active() {
                return Err(Error::invalid_transition("start", state.status));
            }
            state.progress = BatchProgress::new(plan.total_images);
            state.plan = Some(plan);
            state.applied = None;
            state.status = BatchStatus::Running;
        }
        self.launch().await;
        Ok(())
    }

    /// Continues an interrupted run from a snapshot.
    ///
    /// The applied baseline starts empty, so the first resumed item
    /// re-applies its full combination regardless of what the panel
    /// currently shows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a run is active.
    pub async fn resume_from(&self, snapshot: ResumeSnapshot) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status.is_active() {
                return Err(Error::invalid_transition("resume", state.status));
            }
            info!(
                index = snapshot.progress.current_index,
                total = snapshot.progress.total_images,
                "Resuming batch from snapshot"
            );
            state.progress = snapshot.progress;
            state.plan = Some(Arc::new(snapshot.plan));
            state.applied = None;
            state.status = BatchStatus::Running;
        }
        self.launch().await;
        Ok(())
    }

    /// Re-runs the loaded plan from the beginning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] while a run is active, or
    /// [`Error::Plan`] when no plan has been loaded yet.
    pub async fn restart(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status.is_active() {
                return Err(Error::invalid_transition("restart", state.status));
            }
            let total = state
                .plan
                .as_ref()
                .ok_or_else(|| Error::plan("no plan loaded"))?
                .total_images;
            state.progress = BatchProgress::new(total);
            state.applied = None;
            state.status = BatchStatus::Running;
        }
        self.launch().await;
        Ok(())
    }

    /// Pauses between items; the in-flight item still finishes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the run is running.
    pub async fn pause(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status != BatchStatus::Running {
                return Err(Error::invalid_transition("pause", state.status));
            }
            state.status = BatchStatus::Paused;
        }
        self.inner.paused.store(true, Ordering::SeqCst);
        self.inner.emit(BatchEvent::StatusChanged {
            status: BatchStatus::Paused,
        });
        self.inner.persist_or_warn().await;
        Ok(())
    }

    /// Resumes a paused run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the run is paused.
    pub async fn resume(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.status != BatchStatus::Paused {
                return Err(Error::invalid_transition("resume", state.status));
            }
            state.status = BatchStatus::Running;
        }
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.emit(BatchEvent::StatusChanged {
            status: BatchStatus::Running,
        });
        self.inner.persist_or_warn().await;
        Ok(())
    }

    /// Requests a stop; the worker winds down on the next item boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] unless the run is running or
    /// paused.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if !matches!(state.status, BatchStatus::Running | BatchStatus::Paused) {
                return Err(Error::invalid_transition("stop", state.status));
            }
            state.status = BatchStatus::Stopping;
        }
        self.inner.halt.store(true, Ordering::SeqCst);
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.emit(BatchEvent::StatusChanged {
            status: BatchStatus::Stopping,
        });
        Ok(())
    }

    /// Resets flags, announces the run, and spawns the worker.
    async fn launch(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        self.inner.halt.store(false, Ordering::SeqCst);
        self.inner.emit(BatchEvent::StatusChanged {
            status: BatchStatus::Running,
        });
        self.inner.persist_or_warn().await;

        let worker = tokio::spawn(ControllerInner::run(self.inner.clone()));
        self.inner.state.lock().worker = Some(worker);
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> BatchStatus {
        self.inner.state.lock().status
    }

    /// Snapshot of the run counters.
    #[must_use]
    pub fn progress(&self) -> BatchProgress {
        self.inner.state.lock().progress.clone()
    }

    /// Registers the event callback, replacing any previous one.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.inner.handler.lock() = Some(handler);
    }

    /// Removes the event callback.
    pub fn clear_event_handler(&self) {
        *self.inner.handler.lock() = None;
    }

    /// Waits for the worker task to finish.
    ///
    /// Returns immediately when no worker is running. A paused worker
    /// never finishes on its own; resume or stop it first.
    pub async fn wait_until_terminal(&self) {
        let worker = self.inner.state.lock().worker.take();
        if let Some(worker) = worker
            && let Err(err) = worker.await
        {
            warn!(error = %err, "Batch worker panicked");
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

impl ControllerInner {
    /// The worker loop: one iteration per combination.
    async fn run(self: Arc<Self>) {
        info!("Batch worker started");
        let completed = loop {
            while self.paused.load(Ordering::SeqCst) && !self.halt.load(Ordering::SeqCst) {
                tokio::time::sleep(self.options.pause_poll).await;
            }
            if self.halt.load(Ordering::SeqCst) {
                break false;
            }

            let Some((plan, index)) = self.next_item() else {
                break true;
            };

            self.run_item(&plan, index).await;
            self.persist_or_warn().await;

            // Pace between items only; the final item ends the run
            // without the extra delay.
            if !self.state.lock().progress.is_done() {
                tokio::time::sleep(self.options.iteration_delay).await;
            }
        };
        self.finish(completed).await;
    }

    /// The next unprocessed combination, or `None` when done.
    fn next_item(&self) -> Option<(Arc<BatchPlan>, u64)> {
        let state = self.state.lock();
        let plan = state.plan.clone()?;
        let index = state.progress.current_index;
        (index < state.progress.total_images).then(|| (plan, index))
    }

    /// Processes one combination and settles its outcome.
    async fn run_item(&self, plan: &BatchPlan, index: u64) {
        debug!(index, total = plan.total_images, "Processing combination");

        match self.process_item(plan, index).await {
            Ok(success) => {
                let progress = {
                    let mut state = self.state.lock();
                    state.progress.record_success(success.bytes);
                    state.applied =
                        Some(AppliedCombination::from_combination(&success.combination));
                    state.progress.advance();
                    state.progress.clone()
                };
                self.emit(BatchEvent::ItemCompleted {
                    index,
                    filename: success.filename,
                    bytes: success.bytes,
                });
                self.emit(BatchEvent::Progress { progress });
            }
            Err(failure) => {
                warn!(index, error = %failure.error, "Combination failed");
                let error = failure.error.to_string();
                let progress = {
                    let mut state = self.state.lock();
                    state.progress.record_failure(FailedItem {
                        index,
                        error: error.clone(),
                        labels: failure.labels,
                    });
                    // The panel state is unknown now; the next item
                    // re-applies its full combination.
                    state.applied = None;
                    state.progress.advance();
                    state.progress.clone()
                };
                self.emit(BatchEvent::ItemFailed { index, error });
                self.emit(BatchEvent::Progress { progress });
            }
        }
    }

    /// Decode, apply, settle, capture, deliver.
    async fn process_item(
        &self,
        plan: &BatchPlan,
        index: u64,
    ) -> StdResult<ItemSuccess, ItemFailure> {
        let combination = combination_for_index(plan, index)
            .map_err(|error| ItemFailure { labels: Vec::new(), error })?;
        let labels: Vec<String> = combination
            .iter()
            .map(|selection| selection.value_label.clone())
            .collect();
        let product = plan.product_name.as_deref().unwrap_or("");
        let filename = item_filename(product, &combination, index);

        let baseline = if self.options.full_reapply {
            None
        } else {
            self.state.lock().applied.clone()
        };
        let actions = diff_actions(&combination, baseline.as_ref());
        debug!(index, changes = actions.len(), "Applying selection diff");

        for selection in &actions {
            if let Err(error) = self.applier.apply(selection).await {
                return Err(ItemFailure { labels, error });
            }
        }

        // The viewer re-renders even when nothing changed; always settle.
        tokio::time::sleep(self.options.settle_after_apply).await;

        let image = match self.capture_with_retries(index).await {
            Ok(image) => image,
            Err(error) => return Err(ItemFailure { labels, error }),
        };
        let bytes = image.bytes.len() as u64;

        if let Err(error) = self.delivery.deliver(&image.bytes, &filename).await {
            return Err(ItemFailure { labels, error });
        }

        debug!(index, filename = %filename, bytes, "Delivered image");
        Ok(ItemSuccess {
            combination,
            filename,
            bytes,
        })
    }

    /// Captures with the per-item attempt budget.
    async fn capture_with_retries(&self, index: u64) -> Result<CapturedImage> {
        let attempts = self.options.retry_attempts.max(1);
        let mut last = None;

        for attempt in 1..=attempts {
            match self
                .pipeline
                .capture(self.options.capture_width, self.options.capture_height)
                .await
            {
                Ok(image) => return Ok(image),
                Err(err) => {
                    warn!(index, attempt, attempts, error = %err, "Capture attempt failed");
                    self.emit(BatchEvent::AttemptFailed {
                        index,
                        attempt,
                        max_attempts: attempts,
                        error: err.to_string(),
                    });
                    last = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(self.options.retry_delay).await;
                    }
                }
            }
        }

        Err(last.unwrap_or_else(|| Error::capture("no capture attempts made")))
    }

    /// Terminal transition once the loop exits.
    async fn finish(&self, completed: bool) {
        let status = if completed {
            BatchStatus::Completed
        } else {
            BatchStatus::Stopped
        };
        let (completed_count, failed_count) = {
            let mut state = self.state.lock();
            state.status = status;
            (state.progress.completed_count, state.progress.failed_count)
        };
        self.paused.store(false, Ordering::SeqCst);
        self.emit(BatchEvent::StatusChanged { status });

        if completed {
            info!(
                completed = completed_count,
                failed = failed_count,
                "Batch completed"
            );
            if let Err(err) = self.clear_snapshot().await {
                warn!(error = %err, "Failed to clear resume snapshot");
            }
            self.emit(BatchEvent::Finished {
                completed: completed_count,
                failed: failed_count,
            });
        } else {
            info!(
                completed = completed_count,
                failed = failed_count,
                "Batch stopped"
            );
            self.persist_or_warn().await;
        }
    }

    // ------------------------------------------------------------------
    // Persistence and events
    // ------------------------------------------------------------------

    /// Persists the current state; failures only warn.
    async fn persist_or_warn(&self) {
        let snapshot = {
            let state = self.state.lock();
            state
                .plan
                .as_ref()
                .map(|plan| ResumeSnapshot::new(plan, state.status, &state.progress))
        };
        let Some(snapshot) = snapshot else { return };
        if let Err(err) = self.resume.save(&snapshot).await {
            warn!(error = %err, "Failed to persist resume snapshot");
        }
    }

    /// Removes the persisted snapshot for the loaded plan.
    async fn clear_snapshot(&self) -> Result<()> {
        let address = {
            let state = self.state.lock();
            state.plan.as_ref().map(|plan| plan.source_address.clone())
        };
        match address {
            Some(address) => self.resume.clear(&address).await,
            None => Ok(()),
        }
    }

    /// Invokes the registered event handler, if any.
    fn emit(&self, event: BatchEvent) {
        let handler = self.handler.lock();
        if let Some(handler) = handler.as_ref() {
            handler(event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
