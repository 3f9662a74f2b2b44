//! Image filename construction.

// ============================================================================
// Imports
// ============================================================================

use crate::label::sanitize_filename;
use crate::plan::Combination;

// ============================================================================
// Filename
// ============================================================================

/// Builds the delivery filename for one batch item.
///
/// Joins the sanitized product name, every selected value label in
/// group order, and the combination index:
/// `Fauteuil_Direction_Rouge_coquelicot_Chrome_17.png`. The index keeps
/// names unique even when sanitization collapses distinct labels.
pub(crate) fn item_filename(product_name: &str, combination: &Combination, index: u64) -> String {
    let mut parts = Vec::with_capacity(combination.len() + 1);
    parts.push(sanitize_filename(product_name));
    parts.extend(
        combination
            .iter()
            .map(|selection| sanitize_filename(&selection.value_label)),
    );
    format!("{}_{index}.png", parts.join("_"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::plan::Selection;

    fn combination(labels: &[&str]) -> Combination {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| Selection {
                group_index: i,
                group_name: format!("Groupe {i}"),
                value_index: 0,
                value_label: (*label).to_string(),
            })
            .collect()
    }

    #[test]
    fn test_filename_joins_product_labels_and_index() {
        let name = item_filename(
            "Fauteuil Direction",
            &combination(&["Rouge coquelicot", "Chromé"]),
            17,
        );
        assert_eq!(name, "Fauteuil_Direction_Rouge_coquelicot_Chrome_17.png");
    }

    #[test]
    fn test_filename_empty_product_falls_back() {
        let name = item_filename("", &combination(&["Rouge"]), 0);
        assert_eq!(name, "untitled_Rouge_0.png");
    }

    #[test]
    fn test_filename_no_selections() {
        let name = item_filename("Chaise", &combination(&[]), 3);
        assert_eq!(name, "Chaise_3.png");
    }

    #[test]
    fn test_filename_distinct_per_index() {
        let a = item_filename("Chaise", &combination(&["Ro/uge"]), 1);
        let b = item_filename("Chaise", &combination(&["Ro?uge"]), 2);
        assert_ne!(a, b);
        assert!(a.ends_with("_1.png"));
        assert!(b.ends_with("_2.png"));
    }
}
