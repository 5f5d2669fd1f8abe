//! Content validity checks
//!
//! Rules are evaluated in declaration order against the trimmed text and the
//! first one that fires decides the reason. The duplicate check runs last and
//! only when a state store is available.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use super::wordlist::MNEMONIC_WORDS;
use super::{GuardKind, GuardOutcome};
use crate::state::{StateStore, DEFAULT_DUPLICATE_WINDOW};

/// Hard protocol limit on cast text, in UTF-8 bytes.
pub const MAX_CAST_BYTES: usize = 320;

const SEED_PHRASE_MIN_WORDS: usize = 12;
const SEED_PHRASE_MAX_WORDS: usize = 24;
const SEED_PHRASE_RATIO: f64 = 0.8;

static HEX_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^0x[a-f0-9]{40}$").expect("hex address pattern"));
static PRIVATE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(0x)?[a-f0-9]{64}$").expect("private key pattern"));
static URL_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://\S+$").expect("url pattern"));

/// Spam heuristics, matched case-insensitively.
pub const SPAM_PATTERNS: &[&str] = &[
    r"free\s+(airdrop|nft|token|mint)",
    r"claim\s+(your|free|now)",
    r"send\s+\d+\s*(eth|sol|btc|usdc)",
    r"dm\s+(me|for)\s+(alpha|whitelist|wl)",
    r"100x\s+gem",
    r"guaranteed\s+(profit|return|gain)",
    r"not\s+financial\s+advice.*buy",
    r"double\s+your\s+(money|crypto|eth)",
    r"limited\s+spots?\s+(left|remaining)",
    r"act\s+(fast|now|quick)",
];

static SPAM: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SPAM_PATTERNS
        .iter()
        .map(|src| {
            let re = RegexBuilder::new(src)
                .case_insensitive(true)
                .build()
                .expect("spam pattern");
            (*src, re)
        })
        .collect()
});

/// A single content check. Returns the rejection reason when it fires.
pub struct ContentRule {
    pub name: &'static str,
    pub check: fn(&str) -> Option<String>,
}

/// Stateless content rules in evaluation order.
pub const RULES: &[ContentRule] = &[
    ContentRule {
        name: "empty",
        check: check_empty,
    },
    ContentRule {
        name: "byte_length",
        check: check_byte_length,
    },
    ContentRule {
        name: "hex_address",
        check: check_hex_address,
    },
    ContentRule {
        name: "private_key",
        check: check_private_key,
    },
    ContentRule {
        name: "seed_phrase",
        check: check_seed_phrase,
    },
    ContentRule {
        name: "url_only",
        check: check_url_only,
    },
    ContentRule {
        name: "spam",
        check: check_spam,
    },
];

pub fn check_empty(trimmed: &str) -> Option<String> {
    trimmed
        .is_empty()
        .then(|| "Cast text is empty after trimming".to_string())
}

pub fn check_byte_length(trimmed: &str) -> Option<String> {
    let bytes = trimmed.len();
    (bytes > MAX_CAST_BYTES)
        .then(|| format!("Cast exceeds {} bytes ({} bytes)", MAX_CAST_BYTES, bytes))
}

pub fn check_hex_address(trimmed: &str) -> Option<String> {
    HEX_ADDRESS.is_match(trimmed).then(|| {
        "Cast is just a hex address; this is almost certainly a bug".to_string()
    })
}

pub fn check_private_key(trimmed: &str) -> Option<String> {
    PRIVATE_KEY
        .is_match(trimmed)
        .then(|| "Cast looks like a private key. BLOCKED for safety".to_string())
}

pub fn check_seed_phrase(trimmed: &str) -> Option<String> {
    looks_like_seed_phrase(trimmed)
        .then(|| "Cast looks like a seed phrase. BLOCKED for safety".to_string())
}

pub fn check_url_only(trimmed: &str) -> Option<String> {
    URL_ONLY
        .is_match(trimmed)
        .then(|| "Cast is just a URL with no commentary; add some text".to_string())
}

pub fn check_spam(trimmed: &str) -> Option<String> {
    SPAM.iter()
        .find(|(_, re)| re.is_match(trimmed))
        .map(|(src, _)| format!("Cast matches spam pattern: /{}/i", src))
}

/// Strip surrounding whitespace and byte-order marks.
pub fn trim_cast(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// 12 to 24 words, more than 80% of them from the mnemonic wordlist.
pub fn looks_like_seed_phrase(text: &str) -> bool {
    let lowered = trim_cast(text).to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.len() < SEED_PHRASE_MIN_WORDS || words.len() > SEED_PHRASE_MAX_WORDS {
        return false;
    }

    let matches = words.iter().filter(|w| MNEMONIC_WORDS.contains(*w)).count();
    matches as f64 / words.len() as f64 > SEED_PHRASE_RATIO
}

/// Validate a cast before sending.
pub fn validate(text: &str, state: Option<&StateStore>) -> GuardOutcome {
    validate_at(text, state, crate::state::now_millis())
}

pub fn validate_at(text: &str, state: Option<&StateStore>, now: i64) -> GuardOutcome {
    let trimmed = trim_cast(text);

    if let Some(reason) = RULES.iter().find_map(|rule| (rule.check)(trimmed)) {
        return GuardOutcome::reject(GuardKind::Content, reason);
    }

    if let Some(state) = state {
        if state.is_duplicate_at(trimmed, DEFAULT_DUPLICATE_WINDOW, now) {
            return GuardOutcome::reject(
                GuardKind::Content,
                "Duplicate of a recent cast (within last hour)",
            );
        }
    }

    GuardOutcome::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PostMeta;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000_000;

    fn reason(text: &str) -> Option<String> {
        validate_at(text, None, T0).reason().map(str::to_string)
    }

    #[test]
    fn test_rules_are_in_documented_order() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "empty",
                "byte_length",
                "hex_address",
                "private_key",
                "seed_phrase",
                "url_only",
                "spam"
            ]
        );
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(reason("").unwrap().contains("empty"));
        assert!(reason("  \n\t ").unwrap().contains("empty"));
    }

    #[test]
    fn test_byte_order_mark_counts_as_blank() {
        assert_eq!(
            reason("\u{feff}").as_deref(),
            Some("Cast text is empty after trimming")
        );
        assert!(reason(" \u{feff}\n").unwrap().contains("empty"));
        assert_eq!(trim_cast("\u{feff}gm\u{feff} "), "gm");
    }

    #[test]
    fn test_byte_limit_counts_utf8_bytes() {
        let exactly = "a".repeat(MAX_CAST_BYTES);
        assert_eq!(reason(&exactly), None);

        // 81 four-byte characters = 324 bytes but only 81 chars
        let emoji = "🚀".repeat(81);
        let r = reason(&emoji).unwrap();
        assert!(r.contains("324 bytes"), "{}", r);
    }

    #[test]
    fn test_byte_limit_ignores_surrounding_whitespace() {
        let padded = format!("   {}   ", "b".repeat(MAX_CAST_BYTES));
        assert_eq!(reason(&padded), None);
    }

    #[test]
    fn test_hex_address() {
        let addr = format!("0x{}", "aB".repeat(20));
        assert!(reason(&addr).unwrap().contains("hex address"));
        // Address with commentary is fine
        assert_eq!(reason(&format!("send tips to {}", addr)), None);
    }

    #[test]
    fn test_private_key_with_and_without_prefix() {
        let key = "f".repeat(64);
        assert!(reason(&key).unwrap().contains("private key"));
        assert!(reason(&format!("0x{}", key)).unwrap().contains("private key"));
        assert!(reason(&format!("  0X{}  ", key.to_uppercase()))
            .unwrap()
            .contains("private key"));
    }

    #[test]
    fn test_seed_phrase_detection() {
        let phrase = "abandon ability able about above absent absorb abstract absurd abuse access accident";
        assert!(looks_like_seed_phrase(phrase));
        assert!(reason(phrase).unwrap().contains("seed phrase"));

        // Same length, mostly ordinary words
        let prose = "we finally shipped the new parser and it handles nested quotes without panicking";
        assert_eq!(prose.split_whitespace().count(), 13);
        assert!(!looks_like_seed_phrase(prose));
    }

    #[test]
    fn test_seed_phrase_word_count_bounds() {
        let eleven = vec!["abandon"; 11].join(" ");
        assert!(!looks_like_seed_phrase(&eleven));
        let twenty_four = vec!["abandon"; 24].join(" ");
        assert!(looks_like_seed_phrase(&twenty_four));
        let twenty_five = vec!["abandon"; 25].join(" ");
        assert!(!looks_like_seed_phrase(&twenty_five));
    }

    #[test]
    fn test_seed_phrase_ratio_must_exceed_eighty_percent() {
        // 10 of 12 words (83%) from the list
        let mut words = vec!["bacon"; 10];
        words.extend(["zebra", "quokka"]);
        assert!(looks_like_seed_phrase(&words.join(" ")));

        // 12 of 15 words is exactly 80%, which is not enough
        let mut words = vec!["bacon"; 12];
        words.extend(["zebra", "quokka", "xylophone"]);
        assert!(!looks_like_seed_phrase(&words.join(" ")));
    }

    #[test]
    fn test_url_only() {
        let r = reason("https://example.com").unwrap();
        assert!(r.contains("just a URL"));
        assert!(reason("HTTP://example.com/path?q=1").is_some());
        assert_eq!(reason("https://example.com worth a read"), None);
    }

    #[test]
    fn test_spam_patterns_report_match() {
        let r = reason("FREE AIRDROP for everyone").unwrap();
        assert!(r.contains("spam pattern"));
        assert!(r.contains("airdrop"));

        assert!(reason("just send 5 ETH to get rich").is_some());
        assert!(reason("DM me for alpha").is_some());
        assert!(reason("this is a 100x gem").is_some());
        assert!(reason("not financial advice but buy now").is_some());
        assert!(reason("only limited spots left").is_some());
        assert!(reason("act fast").is_some());
    }

    #[test]
    fn test_spam_first_pattern_wins() {
        // Matches both "claim now" and "act now"; claim comes first in the list
        let r = reason("claim now and act now").unwrap();
        assert!(r.contains("claim"), "{}", r);
    }

    #[test]
    fn test_ordinary_text_passes() {
        assert_eq!(reason("gm, reading about borrow checker internals"), None);
        assert_eq!(reason("the act of writing tests is underrated"), None);
    }

    #[test]
    fn test_duplicate_within_window() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = StateStore::open(temp_dir.path().join("state.json"), 50);
        state
            .record_post_at("Hello Farcaster", "0x1", PostMeta::default(), T0)
            .unwrap();

        let outcome = validate_at("  hello farcaster ", Some(&state), T0 + 60_000);
        assert!(outcome.reason().unwrap().contains("Duplicate"));

        let later = validate_at("hello farcaster", Some(&state), T0 + 3_600_001);
        assert!(later.is_pass());
    }

    #[test]
    fn test_static_rules_win_over_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = StateStore::open(temp_dir.path().join("state.json"), 50);
        state
            .record_post_at("https://example.com", "0x1", PostMeta::default(), T0)
            .unwrap();

        let outcome = validate_at("https://example.com", Some(&state), T0 + 1);
        assert!(outcome.reason().unwrap().contains("URL"));
    }
}
