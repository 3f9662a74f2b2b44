//! Lazy mixed-radix combination indexing.
//!
//! A plan with group radices `r0, r1, ..., rk` spans
//! `total = r0 * r1 * ... * rk` combinations. Index `n` decodes like a
//! wheel odometer: the last group is least significant, so consecutive
//! indices differ only in a suffix of groups and diff-based application
//! stays cheap.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::model::{BatchPlan, Combination, Selection};

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a flat index into a concrete combination.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] when `index >= plan.total_images`.
pub fn combination_for_index(plan: &BatchPlan, index: u64) -> Result<Combination> {
    if index >= plan.total_images {
        return Err(Error::index_out_of_range(index, plan.total_images));
    }

    let mut selections = Vec::with_capacity(plan.groups.len());
    let mut n = index;
    for group in plan.groups.iter().rev() {
        let radix = group.radix();
        let ordinal = (n % radix) as usize;
        n /= radix;

        let value = &group.values[ordinal];
        selections.push(Selection {
            group_index: group.group_index,
            group_name: group.name.clone(),
            value_index: value.value_index,
            value_label: value.label.clone(),
        });
    }
    selections.reverse();

    Ok(selections)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encodes a combination back into its flat index.
///
/// Inverse of [`combination_for_index`] for combinations that belong to
/// the plan.
///
/// # Errors
///
/// Returns [`Error::Plan`] when the combination's shape or values do not
/// match the plan.
pub fn index_for_combination(plan: &BatchPlan, combination: &Combination) -> Result<u64> {
    if combination.len() != plan.groups.len() {
        return Err(Error::plan(format!(
            "combination has {} selections, plan has {} groups",
            combination.len(),
            plan.groups.len()
        )));
    }

    let mut index: u64 = 0;
    for (group, selection) in plan.groups.iter().zip(combination) {
        let ordinal = group
            .values
            .iter()
            .position(|v| v.value_index == selection.value_index)
            .ok_or_else(|| {
                Error::plan(format!(
                    "value '{}' not in plan group '{}'",
                    selection.value_label, group.name
                ))
            })?;
        index = index * group.radix() + ordinal as u64;
    }

    Ok(index)
}

// ============================================================================
// Tests
// ============================================================================
