//! IoC extraction
//!
//! Finds network and file indicators in sanitized text:
//! - IPv4 addresses (dotted-quad lexical match)
//! - Domains (filename-like candidates excluded)
//! - Email addresses (common obfuscations reversed first)
//! - File hashes, bucketed by algorithm from exact hex-run length
//!
//! All collections carry set semantics; ordering is imposed only by the
//! result aggregator.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Hash algorithm, derived purely from hex-digit run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// Classify a full hex token by its exact length.
    pub fn from_token_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(Self::Md5),
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Hash values bucketed by algorithm. The buckets are disjoint by
/// construction: classification keys on the exact length of a full token,
/// so a 64-char run never also registers 32- or 40-char substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashBuckets {
    pub md5: HashSet<String>,
    pub sha1: HashSet<String>,
    pub sha256: HashSet<String>,
}

impl HashBuckets {
    fn insert(&mut self, algorithm: HashAlgorithm, value: &str) {
        let bucket = match algorithm {
            HashAlgorithm::Md5 => &mut self.md5,
            HashAlgorithm::Sha1 => &mut self.sha1,
            HashAlgorithm::Sha256 => &mut self.sha256,
        };
        bucket.insert(value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.md5.is_empty() && self.sha1.is_empty() && self.sha256.is_empty()
    }
}

/// Extracted indicators of compromise, deduplicated per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IocSet {
    pub ip_addresses: HashSet<String>,
    pub domains: HashSet<String>,
    pub emails: HashSet<String>,
    pub hashes: HashBuckets,
}

// No octet-range validation: 999.999.999.999 is accepted. Documented
// limitation of the lexical rule.
static IPV4_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:https?://)?(?:www\.)?([a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}(?:/[^\s]*)?)")
        .unwrap()
});

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\b").unwrap());

// Full hex tokens only; word boundaries reject runs embedded in longer
// alphanumeric tokens, so classification sees whole tokens, not substrings.
static HEX_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-fA-F0-9]+\b").unwrap());

static AT_OBFUSCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[at\]|\(at\)").unwrap());

static DOT_OBFUSCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\.\]|\(\.\)|\[dot\]|\(dot\)").unwrap());

/// Curated suffix denylist that keeps filename-like strings out of the
/// domain set: executables, archives, documents, source code, temp/log/
/// config leftovers.
const FILE_EXTENSIONS: &[&str] = &[
    ".exe", ".dll", ".msi", ".bat", ".cmd", ".scr", ".pif", ".gadget", ".bin", ".sys", ".apk",
    ".app", ".dmg", ".iso", ".run", ".jar", ".class", ".vbs", ".vbe", ".wsf", ".ps1", ".sh",
    ".bash", ".zsh", ".zip", ".tar", ".rar", ".cab", ".torrent", ".xz", ".gz", ".7z", ".pdf",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".eml", ".chm", ".csv",
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".py", ".c", ".cpp", ".h", ".hpp", ".java", ".php",
    ".asp", ".aspx", ".jsp", ".cs", ".vb", ".js", ".ts", ".css", ".scss", ".less", ".htm",
    ".html", ".xml", ".yml", ".yaml", ".json", ".sql", ".pl", ".rb", ".go", ".swift", ".kt",
    ".kts", ".ini", ".conf", ".cfg", ".reg", ".log", ".bak", ".old", ".temp", ".tmp", ".swp",
    ".swo", ".dat", ".git",
];

/// Reverse common defanging before lexical extraction: `[.]`/`(.)`/`(dot)`
/// to `.` and `[at]`/`(at)` to `@`.
pub fn deobfuscate(text: &str) -> String {
    let dotted = DOT_OBFUSCATION.replace_all(text, ".");
    AT_OBFUSCATION.replace_all(&dotted, "@").into_owned()
}

/// Extract all IoC categories from sanitized text.
pub fn extract_iocs(text: &str) -> IocSet {
    let text = deobfuscate(text);
    let mut iocs = IocSet::default();

    for m in IPV4_REGEX.find_iter(&text) {
        iocs.ip_addresses.insert(m.as_str().to_string());
    }

    for cap in DOMAIN_REGEX.captures_iter(&text) {
        let candidate = &cap[1];
        if !is_filename_like(candidate) {
            iocs.domains.insert(candidate.to_string());
        }
    }

    for m in EMAIL_REGEX.find_iter(&text) {
        if let Some(email) = validate_email(m.as_str()) {
            iocs.emails.insert(email.to_string());
        }
    }

    for m in HEX_TOKEN_REGEX.find_iter(&text) {
        if let Some(algorithm) = HashAlgorithm::from_token_len(m.as_str().len()) {
            iocs.hashes.insert(algorithm, m.as_str());
        }
    }

    iocs
}

/// A domain candidate whose trailing segment matches the extension
/// denylist is a filename, not a host.
fn is_filename_like(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    FILE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Accept a candidate only with exactly one `@` and a dotted domain part.
fn validate_email(candidate: &str) -> Option<&str> {
    let mut parts = candidate.split('@');
    let _local = parts.next()?;
    let domain = parts.next()?;
    if parts.next().is_some() || !domain.contains('.') {
        return None;
    }
    Some(candidate)
}
