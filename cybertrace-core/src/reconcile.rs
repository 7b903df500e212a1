//! Cross-category reconciliation
//!
//! The extractors run independently, so one string can surface as actor,
//! malware, and targeted entity at once. Reconciliation applies a fixed
//! precedence, Malware > Actor > TargetedEntity: actors lose to malware
//! first, then entities lose to the already-cleaned actor set and to
//! malware. The order matters because the entity subtraction depends on
//! the cleaned actor set.

use std::collections::HashSet;

/// Provisional category of a candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Actor,
    Malware,
    TargetedEntity,
    Sector,
    Region,
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    Gazetteer,
    Contextual,
}

/// A raw text span with a provisional label, mutable only during
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub text: String,
    pub kind: CandidateKind,
    pub source: CandidateSource,
}

impl Candidate {
    pub fn new(text: impl Into<String>, kind: CandidateKind, source: CandidateSource) -> Self {
        Self { text: text.into(), kind, source }
    }
}

/// Mutually exclusive category sets after reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub actors: HashSet<String>,
    pub malware: HashSet<String>,
    pub entities: HashSet<String>,
}

/// Partition candidates into disjoint actor/malware/entity sets.
///
/// Sector and region candidates fold into the targeted-entity set.
/// Membership comparison is case-insensitive so `Lockbit` the "actor"
/// still loses to `LockBit` the malware family.
pub fn reconcile(candidates: Vec<Candidate>) -> Reconciled {
    let mut actors = HashSet::new();
    let mut malware = HashSet::new();
    let mut entities = HashSet::new();

    for candidate in candidates {
        match candidate.kind {
            CandidateKind::Actor => actors.insert(candidate.text),
            CandidateKind::Malware => malware.insert(candidate.text),
            CandidateKind::TargetedEntity | CandidateKind::Sector | CandidateKind::Region => {
                entities.insert(candidate.text)
            }
        };
    }

    let malware_keys: HashSet<String> = malware.iter().map(|m| m.to_lowercase()).collect();
    actors.retain(|a| !malware_keys.contains(&a.to_lowercase()));

    let actor_keys: HashSet<String> = actors.iter().map(|a| a.to_lowercase()).collect();
    entities.retain(|e| {
        let key = e.to_lowercase();
        !actor_keys.contains(&key) && !malware_keys.contains(&key)
    });

    Reconciled { actors, malware, entities }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, kind: CandidateKind) -> Candidate {
        Candidate::new(text, kind, CandidateSource::Gazetteer)
    }

    #[test]
    fn test_malware_takes_precedence_over_actor() {
        let out = reconcile(vec![
            candidate("DarkSide", CandidateKind::Actor),
            candidate("DarkSide", CandidateKind::Malware),
        ]);
        assert!(out.malware.contains("DarkSide"));
        assert!(!out.actors.contains("DarkSide"));
    }

    #[test]
    fn test_entity_loses_to_actor_and_malware() {
        let out = reconcile(vec![
            candidate("Turla", CandidateKind::Actor),
            candidate("Turla", CandidateKind::TargetedEntity),
            candidate("Emotet", CandidateKind::Malware),
            candidate("Emotet", CandidateKind::TargetedEntity),
            candidate("finance", CandidateKind::Sector),
        ]);
        assert!(out.actors.contains("Turla"));
        assert!(out.malware.contains("Emotet"));
        assert_eq!(out.entities, HashSet::from(["finance".to_string()]));
    }

    #[test]
    fn test_comparison_is_case_insensitive() {
        let out = reconcile(vec![
            candidate("lockbit", CandidateKind::Actor),
            candidate("LockBit", CandidateKind::Malware),
        ]);
        assert!(out.actors.is_empty());
    }

    #[test]
    fn test_disjointness_invariant() {
        let names = ["Ryuk", "Wizard Spider", "healthcare", "Ukraine", "Conti"];
        let mut candidates = Vec::new();
        for name in names {
            candidates.push(candidate(name, CandidateKind::Actor));
            candidates.push(candidate(name, CandidateKind::Malware));
            candidates.push(candidate(name, CandidateKind::TargetedEntity));
        }
        let out = reconcile(candidates);
        let lower =
            |set: &HashSet<String>| -> HashSet<String> { set.iter().map(|s| s.to_lowercase()).collect() };
        assert!(lower(&out.actors).is_disjoint(&lower(&out.malware)));
        assert!(lower(&out.entities).is_disjoint(&lower(&out.actors)));
        assert!(lower(&out.entities).is_disjoint(&lower(&out.malware)));
    }
}
