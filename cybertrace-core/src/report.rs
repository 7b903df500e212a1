//! Extraction result types
//!
//! The serialized shape follows the established output contract: optional
//! top-level keys `IoCs`, `TTPs`, `Malware Name`, `Malware Details`,
//! `Actors`, `Entities`, with an `Error` key replacing everything else on
//! total failure. Absent categories are omitted, not emitted as null.

use serde::{Deserialize, Serialize};

/// Hash values grouped by algorithm, lexicographically sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashReport {
    #[serde(rename = "MD5")]
    pub md5: Vec<String>,
    #[serde(rename = "SHA1")]
    pub sha1: Vec<String>,
    #[serde(rename = "SHA256")]
    pub sha256: Vec<String>,
}

/// The four IoC categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IocReport {
    #[serde(rename = "IP addresses")]
    pub ip_addresses: Vec<String>,
    #[serde(rename = "Domains")]
    pub domains: Vec<String>,
    #[serde(rename = "Email addresses")]
    pub emails: Vec<String>,
    #[serde(rename = "File hashes")]
    pub file_hashes: HashReport,
}

/// Matched tactics and techniques as `[id, name]` pairs, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtpReport {
    #[serde(rename = "Tactics")]
    pub tactics: Vec<(String, String)>,
    #[serde(rename = "Techniques")]
    pub techniques: Vec<(String, String)>,
}

/// Final structured result of one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    #[serde(rename = "IoCs", skip_serializing_if = "Option::is_none")]
    pub iocs: Option<IocReport>,

    #[serde(rename = "TTPs", skip_serializing_if = "Option::is_none")]
    pub ttps: Option<TtpReport>,

    #[serde(rename = "Malware Name", skip_serializing_if = "Option::is_none")]
    pub malware_names: Option<Vec<String>>,

    #[serde(rename = "Malware Details", skip_serializing_if = "Option::is_none")]
    pub malware_details: Option<Vec<String>>,

    #[serde(rename = "Actors", skip_serializing_if = "Option::is_none")]
    pub actors: Option<Vec<String>>,

    #[serde(rename = "Entities", skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,

    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionReport {
    /// A single-key error result; carries no other categories.
    pub fn error(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), ..Self::default() }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
