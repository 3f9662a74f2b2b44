//! Scroll and view navigation over a virtualized option panel.
//!
//! The panel only renders rows intersecting the viewport, so every
//! enumeration walks the list in scroll passes: snapshot the rendered
//! rows, step by most of a viewport, repeat until the scroll position
//! saturates or a pass cap trips. Handles are transient; anything
//! found in an earlier pass must be re-resolved before clicking.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::engine::EngineOptions;
use crate::error::{Error, Result};
use crate::surface::{AutomationSurface, ControlHandle, ScrollRegion, ScrollState};
use crate::wait::wait_for;

use super::patterns::is_back_label;

// ============================================================================
// Constants
// ============================================================================

/// Most back clicks attempted when returning to the group list.
const MAX_BACK_CLICKS: u32 = 3;

// ============================================================================
// Navigator
// ============================================================================

/// Drives scrolling and view transitions on an automation surface.
pub(crate) struct Navigator {
    surface: Arc<dyn AutomationSurface>,
    options: Arc<EngineOptions>,
}

impl Navigator {
    pub fn new(surface: Arc<dyn AutomationSurface>, options: Arc<EngineOptions>) -> Self {
        Self { surface, options }
    }

    /// The rendered back control, if any view is showing one.
    async fn back_control(&self) -> Result<Option<ControlHandle>> {
        let controls = self.surface.visible_controls().await?;
        Ok(controls
            .into_iter()
            .find(|control| is_back_label(&control.normalized_label())))
    }

    /// Returns to the group list by clicking back controls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enumeration`] when a back control is still
    /// rendered after [`MAX_BACK_CLICKS`] attempts.
    pub async fn ensure_at_group_list(&self) -> Result<()> {
        for _ in 0..MAX_BACK_CLICKS {
            let Some(back) = self.back_control().await? else {
                return Ok(());
            };
            if let Err(err) = self.surface.click(&back).await {
                // Stale handle; the next pass re-resolves it.
                debug!(error = %err, "Back click missed, retrying");
            }
            tokio::time::sleep(self.options.click_settle).await;
        }

        if self.back_control().await?.is_none() {
            Ok(())
        } else {
            Err(Error::enumeration("still in a detail view after backing out"))
        }
    }

    /// Waits until a value detail view is showing.
    pub async fn wait_for_value_view(&self, timeout: Duration) -> Result<()> {
        let surface = &self.surface;
        wait_for(
            "value view",
            timeout,
            self.options.view_poll_interval,
            || async {
                let controls = surface.visible_controls().await?;
                Ok(controls
                    .iter()
                    .any(|control| is_back_label(&control.normalized_label()))
                    .then_some(()))
            },
        )
        .await
    }

    /// Waits until the group list is showing again.
    pub async fn wait_for_group_list(&self, timeout: Duration) -> Result<()> {
        let surface = &self.surface;
        wait_for(
            "group list",
            timeout,
            self.options.view_poll_interval,
            || async {
                let controls = surface.visible_controls().await?;
                Ok((!controls
                    .iter()
                    .any(|control| is_back_label(&control.normalized_label())))
                .then_some(()))
            },
        )
        .await
    }

    /// Collects every distinct rendered row label across scroll passes.
    ///
    /// Labels come back in first-encounter order. A non-scrollable or
    /// absent region yields a single snapshot.
    pub async fn collect_labels(&self, region: ScrollRegion, passes: u32) -> Result<Vec<String>> {
        let mut seen = FxHashSet::default();
        let mut labels = Vec::new();
        let mut state = self.rewind(region).await?;

        for pass in 0..passes {
            for control in self.surface.visible_controls().await? {
                if seen.insert(control.label.clone()) {
                    labels.push(control.label);
                }
            }

            let Some(current) = &state else { break };
            if !current.is_scrollable() || current.is_saturated() {
                break;
            }
            if pass + 1 == passes {
                debug!(%region, passes, "Scroll pass cap reached before saturation");
                break;
            }
            state = self.step(region, current).await?;
        }

        Ok(labels)
    }

    /// Finds the first rendered row whose label satisfies `matcher`,
    /// scanning across scroll passes.
    ///
    /// The returned handle was resolved in the current viewport and is
    /// safe to click until the next scroll.
    pub async fn locate<F>(
        &self,
        region: ScrollRegion,
        passes: u32,
        matcher: F,
    ) -> Result<Option<ControlHandle>>
    where
        F: Fn(&str) -> bool,
    {
        let mut state = self.rewind(region).await?;

        for pass in 0..passes {
            for control in self.surface.visible_controls().await? {
                if matcher(&control.label) {
                    return Ok(Some(control));
                }
            }

            let Some(current) = &state else { break };
            if !current.is_scrollable() || current.is_saturated() {
                break;
            }
            if pass + 1 == passes {
                break;
            }
            state = self.step(region, current).await?;
        }

        Ok(None)
    }

    /// Scrolls the region back to the top and settles.
    async fn rewind(&self, region: ScrollRegion) -> Result<Option<ScrollState>> {
        let state = self.surface.scroll_state(region).await?;
        match &state {
            Some(s) if s.is_scrollable() && s.offset > 0.0 => {
                self.surface.scroll_to(region, 0.0).await?;
                tokio::time::sleep(self.options.scroll_settle).await;
                self.surface.scroll_state(region).await
            }
            _ => Ok(state),
        }
    }

    /// One scroll step down, settled, with the state re-read.
    async fn step(&self, region: ScrollRegion, state: &ScrollState) -> Result<Option<ScrollState>> {
        let step = self.options.min_scroll_step.max(0.75 * state.viewport);
        self.surface.scroll_to(region, state.offset + step).await?;
        tokio::time::sleep(self.options.scroll_settle).await;
        self.surface.scroll_state(region).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::label::normalize_label;
    use crate::surface::fake::{FakeConfigurator, FakeGroup};

    fn fast_options() -> Arc<EngineOptions> {
        let mut options = EngineOptions::new();
        options.click_settle = Duration::from_millis(1);
        options.scroll_settle = Duration::from_millis(1);
        options.view_poll_interval = Duration::from_millis(5);
        options.view_wait_timeout = Duration::from_millis(100);
        options.scan_view_timeout = Duration::from_millis(100);
        Arc::new(options)
    }

    fn many_groups(n: usize) -> Vec<FakeGroup> {
        (0..n)
            .map(|i| FakeGroup::new(&format!("Groupe {i}"), &["A1", "B2"]))
            .collect()
    }

    #[tokio::test]
    async fn test_collect_labels_covers_virtualized_list() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(12)));
        let navigator = Navigator::new(fake, fast_options());

        let labels = navigator
            .collect_labels(ScrollRegion::GroupList, 40)
            .await
            .unwrap();

        assert_eq!(labels.len(), 12);
        assert!(labels[0].starts_with("Groupe 0"));
        assert!(labels[11].starts_with("Groupe 11"));
    }

    #[tokio::test]
    async fn test_collect_labels_single_pass_when_not_scrollable() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(3)));
        let navigator = Navigator::new(fake, fast_options());

        let labels = navigator
            .collect_labels(ScrollRegion::GroupList, 40)
            .await
            .unwrap();

        assert_eq!(labels.len(), 3);
    }

    #[tokio::test]
    async fn test_collect_labels_pass_cap_stops_early() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(30)));
        let navigator = Navigator::new(fake, fast_options());

        let labels = navigator
            .collect_labels(ScrollRegion::GroupList, 2)
            .await
            .unwrap();

        assert!(labels.len() < 30);
        assert!(!labels.is_empty());
    }

    #[tokio::test]
    async fn test_locate_finds_off_screen_row() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(12)));
        let navigator = Navigator::new(fake.clone(), fast_options());

        let handle = navigator
            .locate(ScrollRegion::GroupList, 40, |label| {
                label.starts_with("Groupe 10")
            })
            .await
            .unwrap()
            .expect("row should be found");

        // The handle is fresh for the current viewport.
        assert!(fake.is_visible(&handle).await.unwrap());
    }

    #[tokio::test]
    async fn test_locate_missing_row_returns_none() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(5)));
        let navigator = Navigator::new(fake, fast_options());

        let found = navigator
            .locate(ScrollRegion::GroupList, 40, |label| label.contains("Absent"))
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_ensure_at_group_list_backs_out_of_values() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(3)));
        let navigator = Navigator::new(fake.clone(), fast_options());

        let controls = fake.visible_controls().await.unwrap();
        fake.click(&controls[0]).await.unwrap();
        navigator.wait_for_value_view(Duration::from_millis(100)).await.unwrap();

        navigator.ensure_at_group_list().await.unwrap();

        let rows = fake.visible_controls().await.unwrap();
        assert!(!rows.iter().any(|c| is_back_label(&normalize_label(&c.label))));
    }

    #[tokio::test]
    async fn test_ensure_at_group_list_noop_when_already_there() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(3)));
        let navigator = Navigator::new(fake, fast_options());

        navigator.ensure_at_group_list().await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_value_view_times_out_on_group_list() {
        let fake = Arc::new(FakeConfigurator::new(many_groups(3)));
        let navigator = Navigator::new(fake, fast_options());

        let err = navigator
            .wait_for_value_view(Duration::from_millis(30))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
    }
}
