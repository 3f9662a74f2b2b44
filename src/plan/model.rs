//! Plan data model.
//!
//! | Type | Role |
//! |------|------|
//! | [`OptionGroup`] / [`OptionValue`] | Scan results: what the UI offers |
//! | [`SelectionSet`] | Which groups/values participate in a batch |
//! | [`BatchPlan`] | Frozen label snapshot defining the combination space |
//! | [`Selection`] / [`Combination`] | One decoded point of that space |

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::label::normalize_label;

// ============================================================================
// Constants
// ============================================================================

/// Snapshot format version embedded in plans.
pub(crate) const PLAN_VERSION: u32 = 1;

// ============================================================================
// Scan Results
// ============================================================================

/// One selectable value inside an option group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    /// Raw label as rendered in the UI.
    pub label: String,
}

impl OptionValue {
    /// Creates a value from its rendered label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Canonical match key for this value.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_label(&self.label)
    }
}

/// One option group as enumerated from the configurator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Group name parsed from its summary row.
    pub name: String,
    /// Option count the summary row advertises, if any.
    pub declared_count: Option<u32>,
    /// Currently selected value shown in the summary row.
    pub current_value: Option<String>,
    /// Values enumerated from the group's value list.
    pub values: Vec<OptionValue>,
}

impl OptionGroup {
    /// Canonical match key for the group name.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_label(&self.name)
    }

    /// Returns `true` when the group enumerated no selectable values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Selection Set
// ============================================================================

#[derive(Debug, Clone)]
enum AllowedValues {
    All,
    Listed(Vec<usize>),
}

/// Chooses which groups participate in a batch and which of their values
/// are allowed.
///
/// Groups keep their inclusion order; that order defines combination
/// order and mixed-radix significance (the last included group varies
/// fastest).
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    entries: Vec<(usize, AllowedValues)>,
}

impl SelectionSet {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes a group with all of its values.
    #[must_use]
    pub fn with_group(mut self, group_index: usize) -> Self {
        self.entries.push((group_index, AllowedValues::All));
        self
    }

    /// Includes a group restricted to the given value indices.
    #[must_use]
    pub fn with_values(
        mut self,
        group_index: usize,
        values: impl IntoIterator<Item = usize>,
    ) -> Self {
        self.entries
            .push((group_index, AllowedValues::Listed(values.into_iter().collect())));
        self
    }

    /// Returns `true` when no group is included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of included groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// Batch Plan
// ============================================================================

/// One allowed value inside a [`PlanGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanValue {
    /// Index into the group's full value list at scan time.
    pub value_index: usize,
    /// Raw value label.
    pub label: String,
}

/// One group inside a [`BatchPlan`]: its name and allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGroup {
    /// Index into the scan results this group came from.
    pub group_index: usize,
    /// Group name at scan time.
    pub name: String,
    /// Allowed values, deduplicated and in ascending `value_index` order.
    pub values: Vec<PlanValue>,
}

impl PlanGroup {
    /// Mixed-radix base contributed by this group.
    #[must_use]
    pub fn radix(&self) -> u64 {
        self.values.len() as u64
    }
}

/// Descriptive metadata frozen into a plan at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanMeta {
    /// Canonical page address the plan belongs to.
    pub source_address: String,
    /// Product name for filenames, when known.
    pub product_name: Option<String>,
    /// Target capture width in pixels.
    pub capture_width: u32,
    /// Target capture height in pixels.
    pub capture_height: u32,
}

/// A frozen, self-contained description of one batch run.
///
/// The plan embeds every label it needs, so decoding combinations and
/// planning diffs never touch scan state. Plans serialize into resume
/// snapshots and must stay stable across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    /// Snapshot format version.
    pub version: u32,
    /// Canonical page address the plan belongs to.
    pub source_address: String,
    /// Product name for filenames, when known.
    pub product_name: Option<String>,
    /// Target capture width in pixels.
    pub capture_width: u32,
    /// Target capture height in pixels.
    pub capture_height: u32,
    /// Build timestamp, milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Participating groups in selection order.
    pub groups: Vec<PlanGroup>,
    /// Total combinations: the product of all group radices.
    pub total_images: u64,
}

impl BatchPlan {
    /// Builds a plan from scan results and a selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Plan`] when the selection is empty, names a group
    /// twice, references an unknown group or value index, includes a
    /// group with no selectable values, or multiplies out past `u64`.
    pub fn build(groups: &[OptionGroup], selection: &SelectionSet, meta: PlanMeta) -> Result<Self> {
        if selection.is_empty() {
            return Err(Error::plan("selection includes no groups"));
        }

        let mut plan_groups = Vec::with_capacity(selection.entries.len());
        let mut seen = vec![false; groups.len()];
        let mut total: u64 = 1;

        for (group_index, allowed) in &selection.entries {
            let group = groups.get(*group_index).ok_or_else(|| {
                Error::plan(format!("group index {group_index} out of range"))
            })?;
            if seen[*group_index] {
                return Err(Error::plan(format!(
                    "group '{}' selected twice",
                    group.name
                )));
            }
            seen[*group_index] = true;

            let indices = match allowed {
                AllowedValues::All => (0..group.values.len()).collect::<Vec<_>>(),
                AllowedValues::Listed(list) => {
                    let mut indices = list.clone();
                    indices.sort_unstable();
                    indices.dedup();
                    if let Some(bad) = indices.iter().find(|i| **i >= group.values.len()) {
                        return Err(Error::plan(format!(
                            "value index {bad} out of range for group '{}'",
                            group.name
                        )));
                    }
                    indices
                }
            };
            if indices.is_empty() {
                return Err(Error::plan(format!(
                    "group '{}' has no selectable values",
                    group.name
                )));
            }

            total = total.checked_mul(indices.len() as u64).ok_or_else(|| {
                Error::plan("combination count exceeds u64 range")
            })?;

            plan_groups.push(PlanGroup {
                group_index: *group_index,
                name: group.name.clone(),
                values: indices
                    .into_iter()
                    .map(|value_index| PlanValue {
                        value_index,
                        label: group.values[value_index].label.clone(),
                    })
                    .collect(),
            });
        }

        debug!(
            groups = plan_groups.len(),
            total_images = total,
            "Built batch plan"
        );

        Ok(Self {
            version: PLAN_VERSION,
            source_address: meta.source_address,
            product_name: meta.product_name,
            capture_width: meta.capture_width,
            capture_height: meta.capture_height,
            created_at_ms: unix_millis(),
            groups: plan_groups,
            total_images: total,
        })
    }

    /// Target aspect ratio (width / height).
    #[must_use]
    pub fn aspect(&self) -> f64 {
        f64::from(self.capture_width) / f64::from(self.capture_height.max(1))
    }
}

// ============================================================================
// Combinations
// ============================================================================

/// One group/value choice inside a combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Index into the scan results.
    pub group_index: usize,
    /// Group name at scan time.
    pub group_name: String,
    /// Index into the group's full value list.
    pub value_index: usize,
    /// Raw value label.
    pub value_label: String,
}

/// A fully specified configuration: one [`Selection`] per plan group, in
/// plan order.
pub type Combination = Vec<Selection>;

// ============================================================================
// Time
// ============================================================================

/// Milliseconds since the Unix epoch.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================
