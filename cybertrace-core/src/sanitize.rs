//! Text sanitizer
//!
//! Neutralizes injected markup and code fragments before any extraction
//! runs. The pass order is fixed: escaping, tag stripping, dangerous-call
//! stripping, control-character removal, non-ASCII removal, comment-suffix
//! stripping.

use regex::Regex;
use std::sync::LazyLock;

// `&` is escaped only when it does not already begin a named character
// entity, which keeps a second sanitizer pass from double-escaping.
static NAMED_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^&[a-zA-Z]+;").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

static DANGEROUS_CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:eval|exec|system|alert|console\.log)\([^)]*\)").unwrap()
});

static CONTROL_CHAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static COMMENT_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(--|#).*").unwrap());

/// Sanitize raw report text.
///
/// Total over all string inputs and idempotent: `sanitize(&sanitize(t)) ==
/// sanitize(t)`. Dropping non-ASCII characters is an accepted lossy
/// simplification, not a bug to fix.
pub fn sanitize(text: &str) -> String {
    // A removal step can occasionally expose a pattern for an earlier step
    // (e.g. non-ASCII removal joining the halves of a split call
    // signature), so the pass runs to a fixed point. Escaping is stable on
    // its own output and every other step only deletes, so this terminates.
    let mut current = sanitize_pass(text);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_pass(text: &str) -> String {
    let escaped = escape_markup(text);
    let stripped = TAG_REGEX.replace_all(&escaped, "");
    let no_calls = DANGEROUS_CALL_REGEX.replace_all(&stripped, "");
    let printable = CONTROL_CHAR_REGEX.replace_all(&no_calls, "");
    let ascii: String = printable.chars().filter(char::is_ascii).collect();
    COMMENT_SUFFIX_REGEX.replace_all(&ascii, "").into_owned()
}

/// Escape markup-significant characters so raw HTML/script fragments cannot
/// be reinterpreted. Single quotes become `&apos;` rather than the numeric
/// entity, since `#` is claimed by the comment-stripping step.
fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.as_bytes()[0] {
            b'&' => {
                if let Some(m) = NAMED_ENTITY.find(tail) {
                    out.push_str(m.as_str());
                    rest = &tail[m.end()..];
                    continue;
                }
                out.push_str("&amp;");
            }
            b'<' => out.push_str("&lt;"),
            b'>' => out.push_str("&gt;"),
            b'"' => out.push_str("&quot;"),
            _ => out.push_str("&apos;"),
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(sanitize("a &lt; b"), "a &lt; b");
        assert_eq!(sanitize("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(sanitize("say \"hi\""), "say &quot;hi&quot;");
    }

    #[test]
    fn test_neutralizes_script_fragment() {
        let out = sanitize("<script>alert('x')</script>");
        assert!(!out.contains('<'));
        assert!(!out.contains("alert("));
    }

    #[test]
    fn test_strips_dangerous_calls() {
        assert_eq!(sanitize("before alert(1) after"), "before  after");

        let out = sanitize("x eval(document.cookie) y console.log(z) w");
        assert!(!out.contains("eval("));
        assert!(!out.contains("console.log("));
    }

    #[test]
    fn test_strips_comment_suffixes() {
        assert_eq!(sanitize("SELECT 1 -- drop everything"), "SELECT 1 ");
        assert_eq!(sanitize("value # trailing note"), "value ");
        // Only the suffix goes, not the whole line's neighbors.
        assert_eq!(sanitize("keep\nthis # not this\nand this"), "keep\nthis \nand this");
    }

    #[test]
    fn test_drops_control_and_non_ascii() {
        assert_eq!(sanitize("a\x07b\u{00e9}c"), "abc");
        // Newlines and tabs survive.
        assert_eq!(sanitize("a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "<script>alert('x')</script> plain & text -- comment",
            "Tom & Jerry &amp; friends \"quoted\" 'single'",
            "report text with IP 10.0.0.1 and hash abc123",
            "caf\u{00e9} \x01\x02 # note",
            "&#x27;&#39;&lt; odd entities",
            "e\u{00e9}val(1) split signature",
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_total_on_odd_inputs() {
        assert_eq!(sanitize(""), "");
        let _ = sanitize("&&&&");
        let _ = sanitize("<<<>>>");
        let _ = sanitize("((((");
    }
}
