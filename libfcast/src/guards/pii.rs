//! Personal-identifier filter
//!
//! A starting policy, not a completeness guarantee: US-style SSNs, 16-digit
//! card numbers, and passport-like tokens. Runs on the raw text.
//!
//! Word boundaries are ASCII-only, so a digit run glued to a non-ASCII letter
//! (`电话123-45-6789`) still counts as standalone.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{GuardKind, GuardOutcome};

static PII_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("SSN", r"(?-u:\b)[0-9]{3}[-.]?[0-9]{2}[-.]?[0-9]{4}(?-u:\b)"),
        (
            "card number",
            r"(?-u:\b)[0-9]{4}[\s-]?[0-9]{4}[\s-]?[0-9]{4}[\s-]?[0-9]{4}(?-u:\b)",
        ),
        ("passport number", r"(?-u:\b)[A-Z]{1,2}[0-9]{6,9}(?-u:\b)"),
    ]
    .into_iter()
    .map(|(label, src)| (label, Regex::new(src).expect("pii pattern")))
    .collect()
});

/// Which kind of identifier `text` appears to contain, if any.
pub fn detect(text: &str) -> Option<&'static str> {
    PII_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(label, _)| *label)
}

pub fn filter(text: &str) -> GuardOutcome {
    match detect(text) {
        Some(label) => GuardOutcome::reject(
            GuardKind::Pii,
            format!("Cast appears to contain PII ({})", label),
        ),
        None => GuardOutcome::Pass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn_variants() {
        assert_eq!(detect("ssn 123-45-6789"), Some("SSN"));
        assert_eq!(detect("ssn 123.45.6789"), Some("SSN"));
        assert_eq!(detect("ssn 123456789"), Some("SSN"));
    }

    #[test]
    fn test_card_number() {
        assert_eq!(detect("card 4111 1111 1111 1111 exp 12/29"), Some("card number"));
        assert_eq!(detect("4111-1111-1111-1111"), Some("card number"));
    }

    #[test]
    fn test_passport_like_token() {
        assert_eq!(detect("passport X1234567 lost"), Some("passport number"));
        assert_eq!(detect("AB123456789"), Some("passport number"));
        // Lowercase prefix does not count
        assert_eq!(detect("ab1234567"), None);
    }

    #[test]
    fn test_identifiers_after_non_ascii_letters() {
        assert_eq!(detect("电话123-45-6789"), Some("SSN"));
        assert_eq!(detect("né4111 1111 1111 1111"), Some("card number"));
        assert_eq!(detect("护照X1234567"), Some("passport number"));
        assert!(!filter("私の番号は078-05-1120です").is_pass());
    }

    #[test]
    fn test_ordinary_numbers_pass() {
        assert_eq!(detect("shipped v2.4.1 with 12 fixes in 2025"), None);
        assert_eq!(detect("call me at ext 4412"), None);
        assert!(filter("no numbers at all").is_pass());
    }

    #[test]
    fn test_reason_names_the_identifier() {
        let outcome = filter("my ssn is 078-05-1120");
        let reason = outcome.reason().unwrap();
        assert!(reason.contains("PII"));
        assert!(reason.contains("SSN"));
    }
}
