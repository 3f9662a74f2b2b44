//! Label normalization and filename sanitization.
//!
//! Configurator UIs render the same logical control with varying
//! whitespace, casing, and accents depending on locale and rerender
//! timing. Every label comparison in this crate goes through
//! [`normalize_label`] so that `"Révéler"`, `"  reveler "`, and
//! `"REVELER"` name the same control.

// ============================================================================
// Constants
// ============================================================================

/// Maximum length (in characters) of a sanitized filename part.
const MAX_FILENAME_LEN: usize = 80;

// ============================================================================
// Diacritic Folding
// ============================================================================

/// Folds a precomposed Latin letter with diacritics to its base letter.
///
/// Covers the Latin-1 Supplement and Latin Extended-A letters that
/// decompose to a base letter plus combining marks. Letters without such
/// a decomposition (`æ`, `ø`, `ß`, ...) pass through unchanged.
fn fold_diacritic(c: char) -> char {
    match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'à'..='å' | 'ā' | 'ă' | 'ą' => 'a',
        'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => 'C',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'Ď' => 'D',
        'ď' => 'd',
        'È'..='Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'è'..='ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => 'G',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'Ĥ' => 'H',
        'ĥ' => 'h',
        'Ì'..='Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => 'I',
        'ì'..='ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'Ĵ' => 'J',
        'ĵ' => 'j',
        'Ķ' => 'K',
        'ķ' => 'k',
        'Ĺ' | 'Ļ' | 'Ľ' => 'L',
        'ĺ' | 'ļ' | 'ľ' => 'l',
        'Ñ' | 'Ń' | 'Ņ' | 'Ň' => 'N',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'Ò'..='Ö' | 'Ō' | 'Ŏ' | 'Ő' => 'O',
        'ò'..='ö' | 'ō' | 'ŏ' | 'ő' => 'o',
        'Ŕ' | 'Ŗ' | 'Ř' => 'R',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'Ś' | 'Ŝ' | 'Ş' | 'Š' => 'S',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'Ţ' | 'Ť' => 'T',
        'ţ' | 'ť' => 't',
        'Ù'..='Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => 'U',
        'ù'..='ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'Ŵ' => 'W',
        'ŵ' => 'w',
        'Ý' | 'Ŷ' | 'Ÿ' => 'Y',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        'ź' | 'ż' | 'ž' => 'z',
        _ => c,
    }
}

/// Returns `true` for Unicode combining diacritical marks.
///
/// Input that arrives already decomposed (base letter followed by a
/// combining accent) loses the mark during normalization, matching the
/// folding applied to precomposed letters.
#[inline]
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

// ============================================================================
// Normalization
// ============================================================================

/// Produces the canonical match key for a control label.
///
/// Folds diacritics, drops combining marks, collapses whitespace runs to
/// a single space, trims, and lowercases. Idempotent.
///
/// # Example
///
/// ```
/// use configurator_capture::label::normalize_label;
///
/// assert_eq!(normalize_label("  Révéler\n le produit "), "reveler le produit");
/// assert_eq!(normalize_label("RETOUR"), normalize_label("retour"));
/// ```
#[must_use]
pub fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        let c = fold_diacritic(c);
        if is_combining_mark(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        // Lowercasing can surface new precomposed letters (U+212B
        // lowercases to U+00E5), so fold once more after it.
        out.extend(c.to_lowercase().map(fold_diacritic));
    }

    out
}

/// Collapses whitespace runs to single spaces and trims, preserving case
/// and accents.
///
/// Group summary labels wrap across rendered lines; parsing runs on the
/// collapsed form.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    out
}

/// Turns an arbitrary label into a safe filename part.
///
/// Folds diacritics, replaces filesystem-hostile characters and
/// whitespace with underscores, collapses underscore runs, trims leading
/// and trailing underscores, and caps the result at 80 characters. Case
/// is preserved. Empty results become `"untitled"`.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_underscore = false;

    for c in raw.chars() {
        let c = fold_diacritic(c);
        if is_combining_mark(c) {
            continue;
        }
        let replaced = c.is_whitespace()
            || c == '_'
            || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*');
        if replaced {
            pending_underscore = !out.is_empty();
            continue;
        }
        if pending_underscore {
            out.push('_');
            pending_underscore = false;
        }
        out.push(c);
    }

    if out.is_empty() {
        return "untitled".to_string();
    }
    if let Some((byte_idx, _)) = out.char_indices().nth(MAX_FILENAME_LEN) {
        out.truncate(byte_idx);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_normalize_folds_diacritics() {
        assert_eq!(normalize_label("Révéler"), "reveler");
        assert_eq!(normalize_label("Palissandre Santos Foncé"), "palissandre santos fonce");
        assert_eq!(normalize_label("Größe"), "große");
    }

    #[test]
    fn test_normalize_equates_variants() {
        assert_eq!(normalize_label("Révéler"), normalize_label("reveler"));
        assert_eq!(normalize_label("  RETOUR  "), normalize_label("Retour"));
        assert_eq!(
            normalize_label("Coque\u{a0}d'assise"),
            normalize_label("coque d'assise")
        );
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_label("  Tissu \n\t Hopsak  "), "tissu hopsak");
        assert_eq!(normalize_label("\n\n"), "");
    }

    #[test]
    fn test_normalize_decomposed_input() {
        // "é" as 'e' + U+0301 combining acute
        assert_eq!(normalize_label("Re\u{0301}ve\u{0301}ler"), "reveler");
    }

    #[test]
    fn test_normalize_leaves_undecomposable_letters() {
        assert_eq!(normalize_label("Bjørn"), "bjørn");
        assert_eq!(normalize_label("Œuvre"), "œuvre");
    }

    #[test]
    fn test_collapse_whitespace_preserves_case() {
        assert_eq!(
            collapse_whitespace("Couleur  \n 12 options\nRouge"),
            "Couleur 12 options Rouge"
        );
    }

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_collapses_and_trims_underscores() {
        assert_eq!(sanitize_filename("  Fauteuil   Grand Repos  "), "Fauteuil_Grand_Repos");
        assert_eq!(sanitize_filename("__a___b__"), "a_b");
    }

    #[test]
    fn test_sanitize_folds_accents() {
        assert_eq!(sanitize_filename("Chêne Foncé"), "Chene_Fonce");
    }

    #[test]
    fn test_sanitize_empty_becomes_untitled() {
        assert_eq!(sanitize_filename(""), "untitled");
        assert_eq!(sanitize_filename("///"), "untitled");
    }

    #[test]
    fn test_sanitize_truncates_at_80_chars() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_filename(&long).chars().count(), 80);
    }

    proptest! {
        #[test]
        fn prop_normalize_idempotent(s in "\\PC{0,64}") {
            let once = normalize_label(&s);
            prop_assert_eq!(normalize_label(&once), once.clone());
        }

        #[test]
        fn prop_sanitize_output_is_safe(s in "\\PC{0,64}") {
            let name = sanitize_filename(&s);
            prop_assert!(!name.is_empty());
            prop_assert!(name.chars().count() <= 80);
            for c in name.chars() {
                prop_assert!(!c.is_whitespace());
                prop_assert!(!matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'));
            }
        }
    }
}
