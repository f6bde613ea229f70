//! Answer matching and proficiency adaptation.

use std::collections::BTreeSet;

use crate::model::ProficiencyMap;
use crate::theory::Key;

/// Separator for answers made of several values, such as a triad `C,E,G`.
pub const VALUE_SEPARATOR: char = ',';

fn value_set(text: &str) -> BTreeSet<String> {
    text.split(VALUE_SEPARATOR)
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Whether a free-text answer matches the expected one.
///
/// Comparison is case-insensitive and ignores surrounding whitespace.
/// Multi-value answers compare as sets, so `"G, C, E"` matches `"C,E,G"`.
/// Empty or garbled input simply fails to match.
#[must_use]
pub fn evaluate(user_answer: &str, expected: &str) -> bool {
    if expected.contains(VALUE_SEPARATOR) {
        let wanted = value_set(expected);
        !wanted.is_empty() && value_set(user_answer) == wanted
    } else {
        let given = user_answer.trim();
        !given.is_empty() && given.to_lowercase() == expected.trim().to_lowercase()
    }
}

/// [`evaluate`] against the expected answer or any accepted alternative.
#[must_use]
pub fn evaluate_any(user_answer: &str, expected: &str, alternatives: &[String]) -> bool {
    evaluate(user_answer, expected) || alternatives.iter().any(|alt| evaluate(user_answer, alt))
}

/// Recover the base key named by an answer.
///
/// Drops an enharmonic suffix (`F#/Gb` → `F#`) and a trailing minor marker
/// (`Am`, `A minor`, `Amin`) before looking the key up.
#[must_use]
pub fn resolve_key(answer: &str) -> Option<Key> {
    let trimmed = answer.trim();
    let head = trimmed.split('/').next().unwrap_or(trimmed).trim();
    let lowered = head.to_lowercase();
    let base = [" minor", "minor", "min", "m"]
        .iter()
        .find_map(|marker| lowered.strip_suffix(marker))
        .unwrap_or(&lowered)
        .trim();
    base.parse().ok()
}

/// Apply a scored answer to the proficiency map.
///
/// Correct answers raise `key` by `increment` (capped at 10). Incorrect
/// answers leave the map untouched. Returns the key's value afterwards.
pub fn adapt(proficiency: &mut ProficiencyMap, key: Key, correct: bool, increment: f64) -> f64 {
    if correct {
        proficiency.credit(key, increment)
    } else {
        proficiency.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MAX_PROFICIENCY, MIN_PROFICIENCY};

    #[test]
    fn multi_value_answers_use_set_equality() {
        assert!(evaluate("C, E, G", "G,C,E"));
        assert!(evaluate(" g , c,e ", "C,E,G"));
        assert!(!evaluate("C,E", "C,E,G"));
        assert!(!evaluate("C,E,G,B", "C,E,G"));
    }

    #[test]
    fn single_values_match_case_insensitively() {
        assert!(evaluate("  am ", "Am"));
        assert!(evaluate("F#", "f#"));
        assert!(!evaluate("A", "Am"));
        assert!(!evaluate("", "C"));
        assert!(!evaluate("   ", "C"));
    }

    #[test]
    fn garbage_never_matches() {
        assert!(!evaluate(",,,", "C,E,G"));
        assert!(!evaluate("@@@", "3"));
    }

    #[test]
    fn alternatives_are_accepted() {
        let alts = vec!["Gb".to_owned()];
        assert!(evaluate_any("gb", "F#", &alts));
        assert!(evaluate_any("F#", "F#", &alts));
        assert!(!evaluate_any("G", "F#", &alts));
    }

    #[test]
    fn resolve_key_strips_markers() {
        assert_eq!(resolve_key("Am"), Some(Key::A));
        assert_eq!(resolve_key("D#m"), Some(Key::EFlat));
        assert_eq!(resolve_key("Bbm"), Some(Key::BFlat));
        assert_eq!(resolve_key("F#/Gb"), Some(Key::FSharp));
        assert_eq!(resolve_key("e minor"), Some(Key::E));
        assert_eq!(resolve_key("G"), Some(Key::G));
        assert_eq!(resolve_key("3"), None);
        assert_eq!(resolve_key("Bdim"), None);
    }

    #[test]
    fn adapt_only_moves_on_correct() {
        let mut map = ProficiencyMap::new();
        assert_eq!(adapt(&mut map, Key::C, false, 0.2), MIN_PROFICIENCY);
        assert!((adapt(&mut map, Key::C, true, 0.2) - 1.2).abs() < 1e-9);
        for _ in 0..100 {
            adapt(&mut map, Key::C, true, 0.3);
        }
        assert_eq!(map.get(Key::C), MAX_PROFICIENCY);
    }
}
