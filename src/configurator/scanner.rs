//! Option group and value enumeration.
//!
//! Walks the group list, opens each group's detail view, harvests its
//! selectable values, and backs out again. The result is the full
//! option tree the combination index is built from.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::EngineOptions;
use crate::error::{Error, Result};
use crate::label::{collapse_whitespace, normalize_label};
use crate::plan::{OptionGroup, OptionValue};
use crate::surface::{AutomationSurface, ScrollRegion};

use super::navigator::Navigator;
use super::patterns::{self, ParsedSummary};

// ============================================================================
// Option Scanner
// ============================================================================

/// Enumerates option groups and their values from the live panel.
pub(crate) struct OptionScanner {
    surface: Arc<dyn AutomationSurface>,
    navigator: Navigator,
    options: Arc<EngineOptions>,
}

impl OptionScanner {
    pub fn new(surface: Arc<dyn AutomationSurface>, options: Arc<EngineOptions>) -> Self {
        let navigator = Navigator::new(surface.clone(), options.clone());
        Self {
            surface,
            navigator,
            options,
        }
    }

    /// Scans the full option tree.
    ///
    /// Groups come back in display order with their advertised counts
    /// and currently selected values. Groups whose detail view exposes
    /// no selectable values are kept with an empty value list so
    /// callers can report them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Enumeration`] when no group summary rows are
    /// found at all.
    pub async fn scan(&self) -> Result<Vec<OptionGroup>> {
        self.navigator.ensure_at_group_list().await?;

        let summaries = self.collect_summaries().await?;
        if summaries.is_empty() {
            return Err(Error::enumeration("no option groups found"));
        }
        info!(groups = summaries.len(), "Enumerating option groups");

        let mut groups = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let values = self.harvest_values(&summary).await?;
            if values.len() as u32 != summary.declared_count {
                warn!(
                    group = %summary.name,
                    declared = summary.declared_count,
                    found = values.len(),
                    "Option count differs from the advertised count"
                );
            }
            groups.push(OptionGroup {
                name: summary.name,
                declared_count: Some(summary.declared_count),
                current_value: Some(summary.current_value),
                values,
            });
        }

        Ok(groups)
    }

    /// Collects group summary rows, deduplicated by normalized name.
    async fn collect_summaries(&self) -> Result<Vec<ParsedSummary>> {
        let labels = self
            .navigator
            .collect_labels(ScrollRegion::GroupList, self.options.group_scan_passes)
            .await?;

        let mut seen = rustc_hash::FxHashSet::default();
        let mut summaries = Vec::new();
        for label in labels {
            let Some(summary) = patterns::parse_summary(&label) else {
                continue;
            };
            if seen.insert(normalize_label(&summary.name)) {
                summaries.push(summary);
            } else {
                warn!(group = %summary.name, "Duplicate group name, keeping the first");
            }
        }
        Ok(summaries)
    }

    /// Opens one group, harvests its values, and backs out.
    async fn harvest_values(&self, summary: &ParsedSummary) -> Result<Vec<OptionValue>> {
        self.open_group(&summary.name).await?;
        let values = self.selectable_values().await?;
        debug!(group = %summary.name, values = values.len(), "Harvested group");
        self.navigator.ensure_at_group_list().await?;
        Ok(values)
    }

    /// Clicks the summary row for `name` and waits for its detail view.
    async fn open_group(&self, name: &str) -> Result<()> {
        let target = normalize_label(name);
        let handle = self
            .navigator
            .locate(ScrollRegion::GroupList, self.options.group_scan_passes, |label| {
                patterns::parse_summary(label)
                    .is_some_and(|summary| normalize_label(&summary.name) == target)
            })
            .await?
            .ok_or_else(|| Error::control_not_found(name, "group list"))?;

        self.surface.click(&handle).await?;
        tokio::time::sleep(self.options.click_settle).await;
        self.navigator
            .wait_for_value_view(self.options.scan_view_timeout)
            .await
    }

    /// Selectable values in the open detail view, chrome filtered out.
    async fn selectable_values(&self) -> Result<Vec<OptionValue>> {
        let labels = self
            .navigator
            .collect_labels(ScrollRegion::ValueList, self.options.value_scan_passes)
            .await?;

        let mut seen = rustc_hash::FxHashSet::default();
        let mut values = Vec::new();
        for label in labels {
            let normalized = normalize_label(&label);
            if patterns::is_selectable_value(&normalized) && seen.insert(normalized) {
                values.push(OptionValue::new(collapse_whitespace(&label)));
            }
        }
        Ok(values)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::surface::fake::{FakeConfigurator, FakeGroup};

    fn fast_options() -> Arc<EngineOptions> {
        let mut options = EngineOptions::new();
        options.click_settle = Duration::from_millis(1);
        options.scroll_settle = Duration::from_millis(1);
        options.view_poll_interval = Duration::from_millis(5);
        options.scan_view_timeout = Duration::from_millis(200);
        Arc::new(options)
    }

    fn scanner(groups: Vec<FakeGroup>) -> OptionScanner {
        OptionScanner::new(Arc::new(FakeConfigurator::new(groups)), fast_options())
    }

    fn three_groups() -> Vec<FakeGroup> {
        vec![
            FakeGroup::new("Couleur", &["Rouge", "Bleu", "Vert"]),
            FakeGroup::new("Taille", &["Petit", "Grand"]),
            FakeGroup::new("Piètement", &["Chromé", "Noir"]),
        ]
    }

    fn value_labels(group: &OptionGroup) -> Vec<&str> {
        group.values.iter().map(|v| v.label.as_str()).collect()
    }

    #[tokio::test]
    async fn test_scan_full_tree() {
        let groups = scanner(three_groups()).scan().await.unwrap();

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].name, "Couleur");
        assert_eq!(groups[0].declared_count, Some(3));
        assert_eq!(groups[0].current_value.as_deref(), Some("Rouge"));
        assert_eq!(value_labels(&groups[0]), ["Rouge", "Bleu", "Vert"]);
        assert_eq!(value_labels(&groups[1]), ["Petit", "Grand"]);
        assert_eq!(value_labels(&groups[2]), ["Chromé", "Noir"]);
    }

    #[tokio::test]
    async fn test_scan_filters_chrome_rows() {
        // The fake surrounds values with Retour, Filtre, and a cart row.
        let groups = scanner(vec![FakeGroup::new("Couleur", &["Rouge"])])
            .scan()
            .await
            .unwrap();

        assert_eq!(value_labels(&groups[0]), ["Rouge"]);
    }

    #[tokio::test]
    async fn test_scan_virtualized_group_list() {
        let many: Vec<FakeGroup> = (0..12)
            .map(|i| FakeGroup::new(&format!("Groupe {i}"), &["A1", "B2"]))
            .collect();

        let groups = scanner(many).scan().await.unwrap();

        assert_eq!(groups.len(), 12);
        assert_eq!(groups[11].name, "Groupe 11");
    }

    #[tokio::test]
    async fn test_scan_keeps_group_with_no_selectable_values() {
        // Every row in this group is filtered as chrome.
        let groups = scanner(vec![
            FakeGroup::new("Couleur", &["Rouge", "Bleu"]),
            FakeGroup::new("Housse", &["Ajouter au panier"]),
        ])
        .scan()
        .await
        .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].name, "Housse");
        assert!(groups[1].values.is_empty());
        assert!(groups[1].is_empty());
    }

    #[tokio::test]
    async fn test_scan_count_mismatch_keeps_actual_values() {
        let groups = scanner(vec![
            FakeGroup::new("Couleur", &["Rouge", "Bleu"]).with_declared_count(9),
        ])
        .scan()
        .await
        .unwrap();

        assert_eq!(groups[0].declared_count, Some(9));
        assert_eq!(groups[0].values.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_dedupes_values_by_normalized_label() {
        let groups = scanner(vec![FakeGroup::new("Couleur", &["Blanc", "BLANC", "Noir"])])
            .scan()
            .await
            .unwrap();

        assert_eq!(value_labels(&groups[0]), ["Blanc", "Noir"]);
    }

    #[tokio::test]
    async fn test_scan_empty_panel_is_an_error() {
        let err = scanner(Vec::new()).scan().await.unwrap_err();
        assert!(err.to_string().contains("no option groups"));
    }

    #[tokio::test]
    async fn test_scan_ends_back_at_group_list() {
        let fake = Arc::new(FakeConfigurator::new(three_groups()));
        let s = OptionScanner::new(fake.clone(), fast_options());

        s.scan().await.unwrap();

        let rows = fake.visible_controls().await.unwrap();
        assert!(rows[0].label.starts_with("Couleur"));
    }
}
