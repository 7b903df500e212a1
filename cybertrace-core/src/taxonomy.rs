//! Taxonomy loading
//!
//! The matcher vocabularies (MITRE ATT&CK tactics/techniques, malware
//! families, actor aliases, sector/country/region gazetteers, malware
//! descriptive tags) come from a versioned JSON resource loaded once per
//! session and read-only afterwards. Missing or malformed data is a fatal
//! configuration error at load time, never a per-document error.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TaxonomyError;

/// One entry of a stable-id taxonomy (a MITRE tactic or technique).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    /// Stable identifier, e.g. `TA0001` or `T1566`
    pub id: String,
    /// Canonical display name, e.g. `Initial Access`
    pub name: String,
}

/// The full vocabulary set consumed by the matchers.
///
/// Safe for concurrent reads; callers typically wrap it in an `Arc` and
/// share it across extraction calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Taxonomy {
    /// Resource version string, carried for provenance
    pub version: String,
    /// MITRE ATT&CK tactics in catalog order
    pub tactics: Vec<TaxonomyEntry>,
    /// MITRE ATT&CK techniques in catalog order
    pub techniques: Vec<TaxonomyEntry>,
    /// Malware family names
    pub malware: Vec<String>,
    /// Threat-actor aliases
    pub actors: Vec<String>,
    /// Sector keywords
    pub sectors: Vec<String>,
    /// Country keywords
    pub countries: Vec<String>,
    /// Region keywords
    pub regions: Vec<String>,
    /// Descriptive malware behavior tags
    pub malware_tags: Vec<String>,
}

const BUNDLED_TAXONOMY: &str = include_str!("../data/taxonomy.json");

impl Taxonomy {
    /// Parse and validate a taxonomy from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, TaxonomyError> {
        let taxonomy: Taxonomy = serde_json::from_str(json)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load a taxonomy from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TaxonomyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The curated taxonomy shipped with the crate.
    pub fn bundled() -> Result<Self, TaxonomyError> {
        Self::from_json_str(BUNDLED_TAXONOMY)
    }

    /// Every section must be populated; an empty vocabulary would silently
    /// disable a matcher.
    fn validate(&self) -> Result<(), TaxonomyError> {
        let sections: [(&'static str, bool); 8] = [
            ("tactics", self.tactics.is_empty()),
            ("techniques", self.techniques.is_empty()),
            ("malware", self.malware.is_empty()),
            ("actors", self.actors.is_empty()),
            ("sectors", self.sectors.is_empty()),
            ("countries", self.countries.is_empty()),
            ("regions", self.regions.is_empty()),
            ("malware_tags", self.malware_tags.is_empty()),
        ];
        for (section, empty) in sections {
            if empty {
                return Err(TaxonomyError::EmptySection { section });
            }
        }
        Ok(())
    }
}
