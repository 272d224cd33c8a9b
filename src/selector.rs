//! The `.match` selection algorithm.
//!
//! A pure function over already-resolved candidate key lists and the
//! message's variants — it has no opinion about *how* a selector's
//! candidate keys were produced (that's `registry.rs`'s
//! `selector_keys()` contract, invoked by the orchestration in `lib.rs`).
//! New, grounded on `seq-compiler`'s `ast.rs` match-arm shape (Seq already
//! models pattern-matching arms as a small enum to score and rank, the
//! same shape this module's scoring loop walks).

use crate::model::{Key, Variant};

/// Select the best-matching variant index, or `None` if nothing matches.
///
/// `selector_candidates[i]` is the ordered candidate-key list for
/// selector `i`; an empty list means "not selectable",
/// so only a catchall can match at that position.
pub fn select(selector_candidates: &[Vec<String>], variants: &[Variant]) -> Option<usize> {
    let mut best: Option<(usize, Vec<usize>, usize)> = None;

    for (variant_index, variant) in variants.iter().enumerate() {
        let Some((catchalls, score)) = score_variant(selector_candidates, variant) else {
            continue;
        };
        let candidate = (catchalls, score, variant_index);
        best = Some(match best {
            None => candidate,
            Some(current) => {
                if candidate.0 < current.0 || (candidate.0 == current.0 && candidate.1 < current.1) {
                    candidate
                } else {
                    current
                }
            }
        });
    }

    best.map(|(_, _, variant_index)| variant_index)
}

/// `None` if the variant doesn't match at all; otherwise the number of
/// catchall positions and the per-selector score tuple.
fn score_variant(selector_candidates: &[Vec<String>], variant: &Variant) -> Option<(usize, Vec<usize>)> {
    let mut score = Vec::with_capacity(variant.keys.len());
    let mut catchalls = 0;

    for (selector_index, key) in variant.keys.iter().enumerate() {
        match key {
            Key::Catchall => {
                catchalls += 1;
                score.push(usize::MAX);
            }
            Key::Literal(k) => {
                let candidates = selector_candidates.get(selector_index).map(Vec::as_slice).unwrap_or(&[]);
                let position = candidates.iter().position(|c| c == k)?;
                score.push(position);
            }
        }
    }

    Some((catchalls, score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pattern;

    fn variant(keys: Vec<Key>) -> Variant {
        Variant { keys, pattern: Pattern::default() }
    }

    #[test]
    fn exact_numeric_key_beats_plural_category() {
        let candidates = vec![vec!["0".to_string(), "other".to_string()]];
        let variants = vec![
            variant(vec![Key::Literal("other".to_string())]),
            variant(vec![Key::Literal("0".to_string())]),
            variant(vec![Key::Catchall]),
        ];
        assert_eq!(select(&candidates, &variants), Some(1));
    }

    #[test]
    fn fewer_catchalls_wins_across_two_selectors() {
        let candidates = vec![vec!["0".to_string(), "other".to_string()], vec!["0".to_string(), "other".to_string()]];
        let variants = vec![
            variant(vec![Key::Catchall, Key::Literal("0".to_string())]),
            variant(vec![Key::Literal("0".to_string()), Key::Literal("0".to_string())]),
        ];
        assert_eq!(select(&candidates, &variants), Some(1));
    }

    #[test]
    fn no_match_returns_none_without_catchall() {
        let candidates = vec![vec!["other".to_string()]];
        let variants = vec![variant(vec![Key::Literal("1".to_string())])];
        assert_eq!(select(&candidates, &variants), None);
    }

    #[test]
    fn ties_favor_earlier_variant_in_source_order() {
        let candidates = vec![vec!["other".to_string()]];
        let variants = vec![variant(vec![Key::Catchall]), variant(vec![Key::Catchall])];
        assert_eq!(select(&candidates, &variants), Some(0));
    }

    #[test]
    fn unselectable_selector_only_catchall_matches() {
        let candidates: Vec<Vec<String>> = vec![Vec::new()];
        let variants = vec![variant(vec![Key::Literal("1".to_string())]), variant(vec![Key::Catchall])];
        assert_eq!(select(&candidates, &variants), Some(1));
    }
}
