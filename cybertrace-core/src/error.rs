//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors raised while loading taxonomy data.
///
/// These are configuration errors: they surface at load time and are never
/// degraded into per-document failures.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse taxonomy JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("taxonomy section `{section}` is empty")]
    EmptySection { section: &'static str },
}
