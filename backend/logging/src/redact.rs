//! Redaction for user-supplied text headed into the logs.

use once_cell::sync::Lazy;
use regex::Regex;

static TELEPHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3,4}[-.\s]?\d{4}").unwrap()
});
static API_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9\-_]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

const MAX_LOGGED_CHARS: usize = 200;

/// Replace phone numbers and API tokens with placeholders.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = TELEPHONE_RE.replace_all(input, "[REDACTED_PHONE]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").into_owned()
}

/// Redact, then cut to a bounded number of characters.
pub fn truncate_for_log(input: &str) -> String {
    let redacted = redact_sensitive_data(input);
    if redacted.chars().count() <= MAX_LOGGED_CHARS {
        return redacted;
    }
    let mut cut: String = redacted.chars().take(MAX_LOGGED_CHARS).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "call 138-1234-5678 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("138-1234-5678"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(redact_sensitive_data("帮我禁言一下alice"), "帮我禁言一下alice");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let long = "禁".repeat(MAX_LOGGED_CHARS + 10);
        let cut = truncate_for_log(&long);
        assert_eq!(cut.chars().count(), MAX_LOGGED_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
