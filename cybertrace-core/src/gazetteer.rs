//! Gazetteer and taxonomy matching
//!
//! Case-insensitive whole-phrase substring matching of fixed vocabularies
//! against the document. TTP matching is deliberately permissive: a tactic
//! or technique name appearing anywhere in the text counts, even
//! incidentally. That precision/recall trade-off is part of the contract.

use std::collections::HashSet;

use crate::taxonomy::TaxonomyEntry;

/// Match every vocabulary phrase that occurs as contiguous text in the
/// document, case-insensitively. Returns the document's casing of each
/// matched phrase (falling back to the canonical form when byte offsets
/// cannot be mapped, i.e. on non-ASCII input).
pub fn match_vocabulary(text: &str, vocabulary: &[String]) -> HashSet<String> {
    let lower = text.to_lowercase();
    let offsets_align = lower.len() == text.len() && text.is_ascii();
    let mut matches = HashSet::new();

    for phrase in vocabulary {
        let needle = phrase.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if let Some(pos) = lower.find(&needle) {
            let matched = if offsets_align && needle.len() == phrase.len() {
                &text[pos..pos + needle.len()]
            } else {
                phrase.as_str()
            };
            matches.insert(matched.to_string());
        }
    }

    matches
}

/// Report every tactic/technique whose canonical name appears in the
/// document, as `(id, name)` entries in catalog order.
pub fn match_ttps(text: &str, entries: &[TaxonomyEntry]) -> Vec<TaxonomyEntry> {
    let lower = text.to_lowercase();
    entries
        .iter()
        .filter(|entry| lower.contains(&entry.name.to_lowercase()))
        .cloned()
        .collect()
}
