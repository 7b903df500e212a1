//! Extraction pipeline
//!
//! Wires the stages together: sanitize, run the independent extractors,
//! reconcile overlapping categories, aggregate per the caller's selection.
//! Each extractor stage is isolated: a failing stage logs a warning and
//! contributes an empty result, so a partial report always beats a crash.

use std::collections::{BTreeSet, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::gazetteer::{match_ttps, match_vocabulary};
use crate::ioc::{extract_iocs, IocSet};
use crate::reconcile::{reconcile, Candidate, CandidateKind, CandidateSource};
use crate::recognizer::{ContextualRecognizer, RecognizerConfig};
use crate::report::{ExtractionReport, HashReport, IocReport, TtpReport};
use crate::sanitize::sanitize;
use crate::taxonomy::{Taxonomy, TaxonomyEntry};

/// Caller-selected extraction toggles. `all` wins over the individual
/// category flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub all: bool,
    pub iocs: bool,
    pub malware: bool,
    pub ttps: bool,
    pub actors: bool,
    pub entities: bool,
}

impl ExtractionOptions {
    /// Every category selected.
    pub fn everything() -> Self {
        Self { all: true, ..Self::default() }
    }

    fn wants_iocs(&self) -> bool {
        self.all || self.iocs
    }

    fn wants_malware(&self) -> bool {
        self.all || self.malware
    }

    fn wants_ttps(&self) -> bool {
        self.all || self.ttps
    }

    fn wants_actors(&self) -> bool {
        self.all || self.actors
    }

    fn wants_entities(&self) -> bool {
        self.all || self.entities
    }
}

/// One-document-at-a-time extraction engine.
///
/// Holds only read-only state (the taxonomy and recognizer configuration),
/// so a single `Extractor` can serve concurrent callers; each `extract`
/// call allocates its own working state.
pub struct Extractor {
    taxonomy: Arc<Taxonomy>,
    recognizer: ContextualRecognizer,
}

impl Extractor {
    pub fn new(taxonomy: Arc<Taxonomy>) -> Self {
        Self { taxonomy, recognizer: ContextualRecognizer::default() }
    }

    pub fn with_recognizer_config(taxonomy: Arc<Taxonomy>, config: RecognizerConfig) -> Self {
        Self { taxonomy, recognizer: ContextualRecognizer::new(config) }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Run the full pipeline over one document.
    ///
    /// Never panics and never returns an unstructured failure: blank input
    /// yields a single-key error report, and any extractor stage that
    /// fails is replaced by an empty result.
    pub fn extract(&self, text: &str, options: &ExtractionOptions) -> ExtractionReport {
        if text.trim().is_empty() {
            return ExtractionReport::error("No valid input provided.");
        }

        let document = sanitize(text);
        let mut report = ExtractionReport::default();

        if options.wants_iocs() {
            let iocs = guarded("ioc", || extract_iocs(&document));
            debug!(
                ips = iocs.ip_addresses.len(),
                domains = iocs.domains.len(),
                emails = iocs.emails.len(),
                "ioc extraction finished"
            );
            report.iocs = Some(ioc_report(iocs));
        }

        if options.wants_ttps() {
            let tactics = guarded("tactics", || match_ttps(&document, &self.taxonomy.tactics));
            let techniques =
                guarded("techniques", || match_ttps(&document, &self.taxonomy.techniques));
            report.ttps = Some(TtpReport {
                tactics: id_name_pairs(tactics),
                techniques: id_name_pairs(techniques),
            });
        }

        let wants_entity_stage =
            options.wants_malware() || options.wants_actors() || options.wants_entities();
        if wants_entity_stage {
            let reconciled = reconcile(self.collect_candidates(&document));
            debug!(
                actors = reconciled.actors.len(),
                malware = reconciled.malware.len(),
                entities = reconciled.entities.len(),
                "entity reconciliation finished"
            );

            if options.wants_malware() {
                report.malware_names = Some(sorted(reconciled.malware));
                let tags =
                    guarded("malware-tags", || match_vocabulary(&document, &self.taxonomy.malware_tags));
                report.malware_details = Some(sorted(tags));
            }
            if options.wants_actors() {
                report.actors = Some(sorted_title_cased(reconciled.actors));
            }
            if options.wants_entities() {
                report.entities = Some(sorted_title_cased(reconciled.entities));
            }
        }

        report
    }

    /// Gather raw candidates from the gazetteers and the contextual
    /// recognizer. Reconciliation needs all three categories even when the
    /// caller asked for only one of them.
    fn collect_candidates(&self, document: &str) -> Vec<Candidate> {
        use CandidateKind::*;
        use CandidateSource::*;

        let malware = guarded("malware-gazetteer", || {
            match_vocabulary(document, &self.taxonomy.malware)
        });
        let actors = guarded("actor-gazetteer", || {
            match_vocabulary(document, &self.taxonomy.actors)
        });
        let sectors = guarded("sector-gazetteer", || {
            match_vocabulary(document, &self.taxonomy.sectors)
        });
        let countries = guarded("country-gazetteer", || {
            match_vocabulary(document, &self.taxonomy.countries)
        });
        let regions = guarded("region-gazetteer", || {
            match_vocabulary(document, &self.taxonomy.regions)
        });
        let recognized = guarded("recognizer", || self.recognizer.recognize(document));

        // Geopolitical names read as targets, never as actors.
        let contextual_actors: HashSet<String> = recognized
            .actors
            .into_iter()
            .filter(|name| !self.is_geographic(name))
            .collect();

        let mut candidates = Vec::new();
        let mut add = |texts: HashSet<String>, kind: CandidateKind, source: CandidateSource| {
            candidates.extend(texts.into_iter().map(|t| Candidate::new(t, kind, source)));
        };
        add(malware, Malware, Gazetteer);
        add(actors, Actor, Gazetteer);
        add(contextual_actors, Actor, Contextual);
        add(recognized.targets, TargetedEntity, Contextual);
        add(sectors, Sector, Gazetteer);
        add(countries, TargetedEntity, Gazetteer);
        add(regions, Region, Gazetteer);
        candidates
    }

    fn is_geographic(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.taxonomy.countries.iter().any(|c| c.to_lowercase() == key)
            || self.taxonomy.regions.iter().any(|r| r.to_lowercase() == key)
    }
}

/// Run one extractor stage, substituting its empty result on failure so
/// the other independent stages still report.
fn guarded<T: Default>(stage: &'static str, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            warn!(stage, "extraction stage failed; substituting empty result");
            T::default()
        }
    }
}

fn ioc_report(iocs: IocSet) -> IocReport {
    IocReport {
        ip_addresses: sorted(iocs.ip_addresses),
        domains: sorted(iocs.domains),
        emails: sorted(iocs.emails),
        file_hashes: HashReport {
            md5: sorted(iocs.hashes.md5),
            sha1: sorted(iocs.hashes.sha1),
            sha256: sorted(iocs.hashes.sha256),
        },
    }
}

fn id_name_pairs(entries: Vec<TaxonomyEntry>) -> Vec<(String, String)> {
    entries.into_iter().map(|e| (e.id, e.name)).collect()
}

fn sorted(set: HashSet<String>) -> Vec<String> {
    let mut values: Vec<String> = set.into_iter().collect();
    values.sort();
    values
}

fn sorted_title_cased(set: HashSet<String>) -> Vec<String> {
    set.into_iter()
        .map(|s| title_case(&s))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Title-case a phrase: capitalize after whitespace and hyphens, lowercase
/// elsewhere. `asia-pacific` becomes `Asia-Pacific`.
fn title_case(phrase: &str) -> String {
    let mut out = String::with_capacity(phrase.len());
    let mut at_word_start = true;
    for c in phrase.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace() || c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(Taxonomy::bundled().unwrap()))
    }

    #[test]
    fn test_blank_input_yields_error_only() {
        let report = extractor().extract("   \n\t ", &ExtractionOptions::everything());
        assert!(report.is_error());
        assert!(report.iocs.is_none());
        assert!(report.actors.is_none());
    }

    #[test]
    fn test_ioc_toggle_yields_only_iocs() {
        let options = ExtractionOptions { iocs: true, ..Default::default() };
        let report = extractor().extract("beacon to 1.2.3.4 from LockBit group", &options);
        assert!(report.iocs.is_some());
        assert!(report.ttps.is_none());
        assert!(report.malware_names.is_none());
        assert!(report.actors.is_none());
        assert!(report.entities.is_none());
        assert!(report.error.is_none());
    }

    #[test]
    fn test_malware_name_preserves_matched_casing() {
        let options = ExtractionOptions { malware: true, ..Default::default() };
        let report = extractor().extract("the LockBit deployment used a backdoor", &options);
        assert!(report.malware_names.unwrap().contains(&"LockBit".to_string()));
        assert!(report.malware_details.unwrap().contains(&"backdoor".to_string()));
    }

    #[test]
    fn test_actor_from_contextual_mention() {
        let options = ExtractionOptions { actors: true, ..Default::default() };
        let report = extractor().extract("The APT29 group breached several ministries.", &options);
        let actors = report.actors.unwrap();
        assert!(actors.iter().any(|a| a.eq_ignore_ascii_case("apt29")));
    }

    #[test]
    fn test_entities_title_cased_and_sorted() {
        let options = ExtractionOptions { entities: true, ..Default::default() };
        let report = extractor().extract(
            "The campaign targeted the healthcare sector and finance industry across eastern europe.",
            &options,
        );
        let entities = report.entities.unwrap();
        assert!(entities.contains(&"Healthcare".to_string()));
        assert!(entities.contains(&"Finance".to_string()));
        assert!(entities.contains(&"Eastern Europe".to_string()));
        let mut expected = entities.clone();
        expected.sort();
        assert_eq!(entities, expected);
    }

    #[test]
    fn test_shared_name_reports_as_malware_only() {
        // DarkSide is both an actor alias and a malware family in the
        // bundled taxonomy; malware precedence wins.
        let report =
            extractor().extract("DarkSide activity resumed last quarter", &ExtractionOptions::everything());
        assert!(report.malware_names.unwrap().contains(&"DarkSide".to_string()));
        assert!(!report.actors.unwrap().iter().any(|a| a.eq_ignore_ascii_case("darkside")));
    }

    #[test]
    fn test_country_mention_stays_in_entities() {
        let report =
            extractor().extract("The group targeted Ukraine.", &ExtractionOptions::everything());
        assert!(!report.actors.unwrap().iter().any(|a| a.eq_ignore_ascii_case("ukraine")));
        assert!(report.entities.unwrap().contains(&"Ukraine".to_string()));
    }

    #[test]
    fn test_all_overrides_individual_toggles() {
        let options = ExtractionOptions { all: true, iocs: false, ..Default::default() };
        let report = extractor().extract("Phishing against finance in ukraine", &options);
        assert!(report.iocs.is_some());
        assert!(report.ttps.is_some());
        assert!(report.malware_names.is_some());
        assert!(report.actors.is_some());
        assert!(report.entities.is_some());
    }

    #[test]
    fn test_panicking_stage_substitutes_empty_result() {
        let iocs: IocSet = guarded("ioc", || panic!("stage failure"));
        assert_eq!(iocs, IocSet::default());

        // The guard leaves later stages untouched.
        let next = guarded("ioc", || extract_iocs("beacon to 1.2.3.4"));
        assert!(next.ip_addresses.contains("1.2.3.4"));
    }

    #[test]
    fn test_recognizer_config_reaches_pipeline() {
        let text = "The Horizon Taskforce group claimed the intrusion.";
        let options = ExtractionOptions { actors: true, ..Default::default() };

        let report = extractor().extract(text, &options);
        assert!(report.actors.unwrap().contains(&"Horizon Taskforce".to_string()));

        let mut config = RecognizerConfig::default();
        config.benign_terms.push("taskforce".to_string());
        let custom =
            Extractor::with_recognizer_config(Arc::new(Taxonomy::bundled().unwrap()), config);
        let report = custom.extract(text, &options);
        assert!(!report
            .actors
            .unwrap()
            .iter()
            .any(|a| a.to_lowercase().contains("taskforce")));
    }

    #[test]
    fn test_ttps_report_catalog_ids() {
        let options = ExtractionOptions { ttps: true, ..Default::default() };
        let report = extractor().extract("Initial access came via phishing.", &options);
        let ttps = report.ttps.unwrap();
        assert!(ttps.tactics.iter().any(|(id, _)| id == "TA0001"));
        assert!(ttps.techniques.iter().any(|(id, _)| id == "T1566"));
    }
}
