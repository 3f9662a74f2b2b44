//! Applies one selection to the live configurator.
//!
//! Opening a group, clicking a value, and backing out is the only way
//! to change the rendered product, so correctness here decides whether
//! captured images match their combination. Value rows are matched
//! exactly on normalized labels first; a containment fallback covers
//! panels that decorate labels with prices or badges.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::EngineOptions;
use crate::error::{Error, Result};
use crate::label::normalize_label;
use crate::plan::Selection;
use crate::surface::{AutomationSurface, ControlHandle, ScrollRegion};

use super::navigator::Navigator;
use super::patterns;

// ============================================================================
// Selection Applier
// ============================================================================

/// Clicks selections into the option panel.
pub(crate) struct SelectionApplier {
    surface: Arc<dyn AutomationSurface>,
    navigator: Navigator,
    options: Arc<EngineOptions>,
}

impl SelectionApplier {
    pub fn new(surface: Arc<dyn AutomationSurface>, options: Arc<EngineOptions>) -> Self {
        let navigator = Navigator::new(surface.clone(), options.clone());
        Self {
            surface,
            navigator,
            options,
        }
    }

    /// Applies one selection: open the group, click the value, back out.
    ///
    /// Starts from the group list regardless of the panel's current
    /// view, so a failed earlier apply does not poison this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ControlNotFound`] when the group or value row
    /// cannot be located, or the surface error from a failed click.
    pub async fn apply(&self, selection: &Selection) -> Result<()> {
        debug!(
            group = %selection.group_name,
            value = %selection.value_label,
            "Applying selection"
        );

        self.navigator.ensure_at_group_list().await?;
        self.open_group(&selection.group_name).await?;
        self.click_value(selection).await?;
        self.back_out().await
    }

    /// Clicks the summary row for `group_name` and waits for its values.
    async fn open_group(&self, group_name: &str) -> Result<()> {
        let target = normalize_label(group_name);
        let handle = self
            .navigator
            .locate(ScrollRegion::GroupList, self.options.locate_passes, |label| {
                patterns::parse_summary(label)
                    .is_some_and(|summary| normalize_label(&summary.name) == target)
            })
            .await?
            .ok_or_else(|| Error::control_not_found(group_name, "group list"))?;

        self.surface.click(&handle).await?;
        tokio::time::sleep(self.options.click_settle).await;
        self.navigator
            .wait_for_value_view(self.options.view_wait_timeout)
            .await
    }

    /// Locates and clicks the value row.
    async fn click_value(&self, selection: &Selection) -> Result<()> {
        let handle = self.locate_value(selection).await?;

        // Re-resolve once if the row left the viewport since locating.
        let handle = if self.surface.is_visible(&handle).await? {
            handle
        } else {
            debug!(value = %selection.value_label, "Value row moved, re-resolving");
            self.locate_value(selection).await?
        };

        self.surface.click(&handle).await?;
        tokio::time::sleep(self.options.click_settle).await;
        Ok(())
    }

    /// Finds the value row, exact normalized match first, containment
    /// fallback second.
    async fn locate_value(&self, selection: &Selection) -> Result<ControlHandle> {
        let target = normalize_label(&selection.value_label);

        let exact = self
            .navigator
            .locate(ScrollRegion::ValueList, self.options.locate_passes, |label| {
                normalize_label(label) == target
            })
            .await?;
        if let Some(handle) = exact {
            return Ok(handle);
        }

        warn!(
            value = %selection.value_label,
            group = %selection.group_name,
            "No exact value match, trying containment"
        );
        self.navigator
            .locate(ScrollRegion::ValueList, self.options.locate_passes, |label| {
                let normalized = normalize_label(label);
                patterns::is_selectable_value(&normalized)
                    && (normalized.contains(&target) || target.contains(&normalized))
            })
            .await?
            .ok_or_else(|| {
                Error::control_not_found(
                    &selection.value_label,
                    format!("values of {}", selection.group_name),
                )
            })
    }

    /// Returns to the group list after a value click.
    async fn back_out(&self) -> Result<()> {
        self.navigator.ensure_at_group_list().await?;
        self.navigator
            .wait_for_group_list(self.options.view_wait_timeout)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
