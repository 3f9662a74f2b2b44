//! Diff planning between consecutive combinations.
//!
//! Applying a selection costs several UI round trips, so the batch loop
//! only reapplies groups whose value actually changed. What is currently
//! applied lives in an [`AppliedCombination`]; after any failed item the
//! caller drops it, because the UI state is no longer trustworthy.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

use crate::label::normalize_label;

use super::model::{Combination, Selection};

// ============================================================================
// Applied Combination
// ============================================================================

/// The set of selections currently applied to the UI, keyed by
/// normalized group name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedCombination {
    entries: FxHashMap<String, String>,
}

impl AppliedCombination {
    /// Creates an empty applied state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the applied state for a fully applied combination.
    #[must_use]
    pub fn from_combination(combination: &Combination) -> Self {
        let mut applied = Self::new();
        for selection in combination {
            applied.record(selection);
        }
        applied
    }

    /// Records one applied selection.
    pub fn record(&mut self, selection: &Selection) {
        self.entries.insert(
            normalize_label(&selection.group_name),
            selection.value_label.clone(),
        );
    }

    /// Raw value label applied for a group, if any.
    #[must_use]
    pub fn value_for(&self, group_name: &str) -> Option<&str> {
        self.entries
            .get(&normalize_label(group_name))
            .map(String::as_str)
    }

    /// Returns `true` when the selection's value is already applied,
    /// compared by normalized label.
    #[must_use]
    pub fn matches(&self, selection: &Selection) -> bool {
        self.value_for(&selection.group_name)
            .is_some_and(|applied| normalize_label(applied) == normalize_label(&selection.value_label))
    }

    /// Number of groups with a recorded value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Diffing
// ============================================================================

/// Computes the selections that must be applied to move to `next`.
///
/// With no applied baseline the whole combination is returned; a resumed
/// or just-failed batch reapplies everything. Otherwise only selections
/// whose value differs from the baseline survive, in combination order.
#[must_use]
pub fn diff_actions(next: &Combination, last: Option<&AppliedCombination>) -> Vec<Selection> {
    match last {
        None => next.clone(),
        Some(applied) => next
            .iter()
            .filter(|selection| !applied.matches(selection))
            .cloned()
            .collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================
