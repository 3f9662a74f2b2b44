//! Batch planning: combination space modeling, indexing, and diffing.
//!
//! A [`BatchPlan`] freezes the option labels chosen for a run, so
//! indexing and diffing are pure functions over the plan and never
//! consult live UI state. The full Cartesian product is indexed lazily
//! through [`combination_for_index`]; it is never materialized.

// ============================================================================
// Modules
// ============================================================================

mod diff;
mod index;
mod model;

// ============================================================================
// Re-exports
// ============================================================================

pub use diff::{AppliedCombination, diff_actions};
pub use index::{combination_for_index, index_for_combination};
pub use model::{
    BatchPlan, Combination, OptionGroup, OptionValue, PlanGroup, PlanMeta, PlanValue, Selection,
    SelectionSet,
};

pub(crate) use model::unix_millis;
