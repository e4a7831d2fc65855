//! Fuzzy string matching used for anchor validation and cross-source
//! reconciliation.
//!
//! `partial_ratio` mirrors the rapidfuzz/fuzzywuzzy "partial ratio":
//! the shorter string is slid as a window over the longer one and the
//! best Levenshtein-derived similarity of any alignment is returned.
//! This makes short strings ("Rodriguez") match inside long ones
//! ("James Rodriguez, 34, of Houston") without being penalized for the
//! surrounding context.

use strsim::levenshtein;

/// Similarity in `[0, 100]`. Symmetric, 100 for identical or
/// substring-containing strings, 0 for a comparison against an empty
/// string.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a = a.trim();
    let b = b.trim();

    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a.eq_ignore_ascii_case(b) {
        return 100;
    }

    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();

    let (shorter, longer) = if a_lower.chars().count() <= b_lower.chars().count() {
        (&a_lower, &b_lower)
    } else {
        (&b_lower, &a_lower)
    };

    if longer.contains(shorter.as_str()) {
        return 100;
    }

    let short_chars: Vec<char> = shorter.chars().collect();
    let long_chars: Vec<char> = longer.chars().collect();
    let short_len = short_chars.len();
    let long_len = long_chars.len();

    if short_len == 0 {
        return 0;
    }
    if short_len > long_len {
        // longer is actually shorter after lowercasing edge cases; fall
        // back to whole-string comparison.
        let dist = levenshtein(&a_lower, &b_lower);
        let max_len = a_lower.chars().count().max(b_lower.chars().count());
        return ratio_from_distance(dist, max_len);
    }

    let mut best = 0u32;
    for start in 0..=(long_len - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let dist = levenshtein(shorter, &window);
        let score = ratio_from_distance(dist, short_len);
        if score > best {
            best = score;
        }
        if best == 100 {
            break;
        }
    }
    best
}

/// Whole-string similarity in `[0, 100]`, unlike `partial_ratio` this does
/// not slide a window — used where both sides are expected to already be
/// single values (cross-article value agreement, reference cross-check)
/// rather than a value embedded in prose.
pub fn ratio(a: &str, b: &str) -> u32 {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    let dist = levenshtein(&a.to_lowercase(), &b.to_lowercase());
    let max_len = a.chars().count().max(b.chars().count());
    ratio_from_distance(dist, max_len)
}

fn ratio_from_distance(distance: usize, max_len: usize) -> u32 {
    if max_len == 0 {
        return 100;
    }
    let similarity = 1.0 - (distance as f64 / max_len as f64);
    (similarity.max(0.0) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_100() {
        assert_eq!(partial_ratio("James Rodriguez", "James Rodriguez"), 100);
    }

    #[test]
    fn substring_containment_scores_100() {
        assert_eq!(partial_ratio("Rodriguez", "James Rodriguez, 34"), 100);
    }

    #[test]
    fn disjoint_strings_score_low() {
        assert!(partial_ratio("Houston", "Albuquerque") < 50);
    }

    #[test]
    fn is_symmetric() {
        let a = "James Rodriguez";
        let b = "Jaime Rodrigues";
        assert_eq!(partial_ratio(a, b), partial_ratio(b, a));
    }

    #[test]
    fn empty_string_scores_zero() {
        assert_eq!(partial_ratio("", "Houston"), 0);
        assert_eq!(partial_ratio("Houston", ""), 0);
    }

    #[test]
    fn ratio_identical_is_100() {
        assert_eq!(ratio("fatal", "fatal"), 100);
    }

    #[test]
    fn ratio_penalizes_prefix_containment_unlike_partial_ratio() {
        // Unlike partial_ratio, plain ratio compares whole strings, so a
        // short value embedded in a longer one scores poorly.
        assert!(ratio("Rodriguez", "James Rodriguez, 34") < 80);
    }

    #[test]
    fn minor_misspelling_scores_above_threshold() {
        // Close enough that the merge reconciliation treats these as the
        // same person (threshold is 80).
        assert!(partial_ratio("Rodriguez", "Rodriquez") >= 80);
    }
}
