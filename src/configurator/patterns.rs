//! Row text classification for the configurator UI.
//!
//! The option panel renders two kinds of rows. Group summaries read
//! `"<name> <count> options <current value>"` once whitespace is
//! collapsed; value rows carry the bare option label. Everything else
//! is navigation chrome (back, filter, cart) that must never be
//! clicked as a value.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use crate::label::collapse_whitespace;

// ============================================================================
// Constants
// ============================================================================

/// Labels that navigate back to the group list.
const BACK_LABELS: &[&str] = &["retour", "back"];

/// Chrome rows inside a value list that are not selectable values.
const NON_VALUE_LABELS: &[&str] = &[
    "filtre", "filter", "comparer", "compare", "reveler", "reveal", "fermer", "close",
];

/// Substrings marking cart actions; rows containing them are chrome.
const CART_MARKERS: &[&str] = &["ajouter au panier", "add to cart", "panier"];

/// Shortest plausible value label, in characters.
const MIN_VALUE_LEN: usize = 2;

/// Longest plausible value label, in characters.
const MAX_VALUE_LEN: usize = 100;

/// Matches a group summary row: name, option count, current value.
static SUMMARY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*(\d+)\s*options?\s+(.+)$").unwrap());

/// Matches the "N options" wording that betrays a summary row.
static OPTION_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\boptions?\b").unwrap());

// ============================================================================
// Parsed Summary
// ============================================================================

/// A group summary row, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedSummary {
    /// Group display name.
    pub name: String,
    /// Option count the UI advertises for this group.
    pub declared_count: u32,
    /// Currently selected value label.
    pub current_value: String,
}

/// Parses a group summary row.
///
/// Returns `None` for rows that do not follow the summary layout,
/// which is how value rows and chrome are told apart from groups.
pub(crate) fn parse_summary(text: &str) -> Option<ParsedSummary> {
    let flat = collapse_whitespace(text);
    let caps = SUMMARY_PATTERN.captures(&flat)?;
    let declared_count = caps[2].parse().ok()?;
    Some(ParsedSummary {
        name: caps[1].to_string(),
        declared_count,
        current_value: caps[3].to_string(),
    })
}

// ============================================================================
// Classification
// ============================================================================

/// Returns `true` when a normalized label navigates back.
pub(crate) fn is_back_label(normalized: &str) -> bool {
    BACK_LABELS.contains(&normalized)
}

/// Returns `true` when a normalized label is a clickable option value.
///
/// Rejects navigation chrome, cart actions, summary-row bleed, and
/// labels outside the plausible length range.
pub(crate) fn is_selectable_value(normalized: &str) -> bool {
    let len = normalized.chars().count();
    if !(MIN_VALUE_LEN..=MAX_VALUE_LEN).contains(&len) {
        return false;
    }
    if is_back_label(normalized) || NON_VALUE_LABELS.contains(&normalized) {
        return false;
    }
    if CART_MARKERS.iter().any(|marker| normalized.contains(marker)) {
        return false;
    }
    !OPTION_WORD.is_match(normalized)
}

// ============================================================================
// Tests
// ============================================================================
