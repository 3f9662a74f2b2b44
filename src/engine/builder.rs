//! Builder pattern for engine configuration.
//!
//! Provides a fluent API for wiring host surfaces into a
//! [`CaptureEngine`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use configurator_capture::{CaptureEngine, EngineOptions, MemoryStore};
//! # use configurator_capture::{AutomationSurface, ViewerSurface, FileDelivery};
//!
//! # fn example(
//! #     automation: Arc<dyn AutomationSurface>,
//! #     viewer: Arc<dyn ViewerSurface>,
//! #     delivery: Arc<dyn FileDelivery>,
//! # ) -> configurator_capture::Result<()> {
//! let engine = CaptureEngine::builder()
//!     .automation(automation)
//!     .viewer(viewer)
//!     .delivery(delivery)
//!     .store(Arc::new(MemoryStore::new()))
//!     .options(EngineOptions::new().with_capture_size(2048, 1536))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::surface::{AutomationSurface, FileDelivery, KeyValueStore, ViewerSurface};

use super::core::CaptureEngine;
use super::options::EngineOptions;

// ============================================================================
// CaptureEngineBuilder
// ============================================================================

/// Builder for configuring a [`CaptureEngine`] instance.
///
/// Use [`CaptureEngine::builder()`] to create a new builder. All four
/// host surfaces are required; options default to production values.
#[derive(Default, Clone)]
pub struct CaptureEngineBuilder {
    /// Configurator UI automation surface.
    automation: Option<Arc<dyn AutomationSurface>>,
    /// Product viewer surface.
    viewer: Option<Arc<dyn ViewerSurface>>,
    /// Finished image sink.
    delivery: Option<Arc<dyn FileDelivery>>,
    /// Resume snapshot store.
    store: Option<Arc<dyn KeyValueStore>>,
    /// Engine tuning knobs.
    options: EngineOptions,
}

impl fmt::Debug for CaptureEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureEngineBuilder")
            .field("automation", &self.automation.is_some())
            .field("viewer", &self.viewer.is_some())
            .field("delivery", &self.delivery.is_some())
            .field("store", &self.store.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// CaptureEngineBuilder Implementation
// ============================================================================

impl CaptureEngineBuilder {
    /// Creates a new engine builder with no surfaces configured.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the automation surface driving the configurator UI.
    #[inline]
    #[must_use]
    pub fn automation(mut self, automation: Arc<dyn AutomationSurface>) -> Self {
        self.automation = Some(automation);
        self
    }

    /// Sets the viewer surface frames are grabbed from.
    #[inline]
    #[must_use]
    pub fn viewer(mut self, viewer: Arc<dyn ViewerSurface>) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// Sets the sink finished images are handed to.
    #[inline]
    #[must_use]
    pub fn delivery(mut self, delivery: Arc<dyn FileDelivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Sets the store resume snapshots persist in.
    #[inline]
    #[must_use]
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the engine options wholesale.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the engine with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a surface is missing or the options
    /// fail validation.
    pub fn build(self) -> Result<CaptureEngine> {
        let automation = self.automation.ok_or_else(|| {
            Error::config(
                "Automation surface is required. Use .automation() to set it.\n\
                 Example: CaptureEngine::builder().automation(surface)",
            )
        })?;
        let viewer = self.viewer.ok_or_else(|| {
            Error::config(
                "Viewer surface is required. Use .viewer() to set it.\n\
                 Example: CaptureEngine::builder().viewer(surface)",
            )
        })?;
        let delivery = self.delivery.ok_or_else(|| {
            Error::config(
                "Delivery sink is required. Use .delivery() to set it.\n\
                 Example: CaptureEngine::builder().delivery(Arc::new(DirectoryDelivery::new(dir)))",
            )
        })?;
        let store = self.store.ok_or_else(|| {
            Error::config(
                "Snapshot store is required. Use .store() to set it.\n\
                 Example: CaptureEngine::builder().store(Arc::new(MemoryStore::new()))",
            )
        })?;
        self.options.validate()?;

        Ok(CaptureEngine::new(
            automation,
            viewer,
            delivery,
            store,
            self.options,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::surface::MemoryStore;
    use crate::surface::fake::{CollectingDelivery, FakeConfigurator, FakeViewer};

    fn surfaces() -> (
        Arc<FakeConfigurator>,
        Arc<FakeViewer>,
        Arc<CollectingDelivery>,
        Arc<MemoryStore>,
    ) {
        (
            Arc::new(FakeConfigurator::new(Vec::new())),
            Arc::new(FakeViewer::new(640, 480)),
            Arc::new(CollectingDelivery::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = CaptureEngineBuilder::new();
        assert!(builder.automation.is_none());
        assert!(builder.viewer.is_none());
        assert!(builder.delivery.is_none());
        assert!(builder.store.is_none());
    }

    #[test]
    fn test_build_with_all_surfaces() {
        let (automation, viewer, delivery, store) = surfaces();
        let engine = CaptureEngineBuilder::new()
            .automation(automation)
            .viewer(viewer)
            .delivery(delivery)
            .store(store)
            .build();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_build_fails_without_automation() {
        let (_, viewer, delivery, store) = surfaces();
        let err = CaptureEngineBuilder::new()
            .viewer(viewer)
            .delivery(delivery)
            .store(store)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Automation surface"));
    }

    #[test]
    fn test_build_fails_without_viewer() {
        let (automation, _, delivery, store) = surfaces();
        let err = CaptureEngineBuilder::new()
            .automation(automation)
            .delivery(delivery)
            .store(store)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Viewer surface"));
    }

    #[test]
    fn test_build_fails_without_delivery() {
        let (automation, viewer, _, store) = surfaces();
        let err = CaptureEngineBuilder::new()
            .automation(automation)
            .viewer(viewer)
            .store(store)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Delivery sink"));
    }

    #[test]
    fn test_build_fails_without_store() {
        let (automation, viewer, delivery, _) = surfaces();
        let err = CaptureEngineBuilder::new()
            .automation(automation)
            .viewer(viewer)
            .delivery(delivery)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Snapshot store"));
    }

    #[test]
    fn test_build_rejects_invalid_options() {
        let (automation, viewer, delivery, store) = surfaces();
        let err = CaptureEngineBuilder::new()
            .automation(automation)
            .viewer(viewer)
            .delivery(delivery)
            .store(store)
            .options(EngineOptions::new().with_capture_size(0, 0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_builder_is_clone() {
        let (automation, _, _, _) = surfaces();
        let builder = CaptureEngineBuilder::new().automation(automation);
        let cloned = builder.clone();
        assert!(cloned.automation.is_some());
    }
}
