//! CyberTrace Core - threat intelligence extraction pipeline
//!
//! This crate provides the extraction-and-canonicalization pipeline:
//! - Text sanitization (markup/code neutralization, obfuscation cleanup)
//! - IoC extraction (IPs, domains, emails, algorithm-bucketed hashes)
//! - Gazetteer/taxonomy matching (malware, actors, sectors, MITRE TTPs)
//! - Contextual entity recognition (trigger-gated heuristic NER)
//! - Cross-category reconciliation and result aggregation
//!
//! The pipeline is synchronous and processes one document per call. The
//! only shared state is the read-only [`Taxonomy`], loaded once per
//! session; callers may run extractions on parallel worker threads without
//! further synchronization.

pub mod error;
pub mod gazetteer;
pub mod ioc;
pub mod pipeline;
pub mod recognizer;
pub mod reconcile;
pub mod report;
pub mod sanitize;
pub mod taxonomy;

pub use error::TaxonomyError;
pub use ioc::{extract_iocs, HashAlgorithm, IocSet};
pub use pipeline::{ExtractionOptions, Extractor};
pub use recognizer::{ContextualRecognizer, RecognizerConfig};
pub use reconcile::{reconcile, Candidate, CandidateKind, CandidateSource};
pub use report::{ExtractionReport, HashReport, IocReport, TtpReport};
pub use sanitize::sanitize;
pub use taxonomy::{Taxonomy, TaxonomyEntry};
