//! Safety guards that gate every outbound cast
//!
//! Three validators run in a fixed order and the first rejection wins:
//!
//! 1. [`content`] - emptiness, size, pasted secrets, bare URLs, spam, duplicates
//! 2. [`pii`] - personal identifiers such as SSNs or card numbers
//! 3. [`rate`] - hourly cap and minimum spacing between casts
//!
//! Guards only read the [`StateStore`]. The one exception is the lazy pruning
//! of expired rate-window entries, which the store persists on its own.
//! Recording a successful cast is the caller's job.
//!
//! # Example
//!
//! ```no_run
//! use libfcast::guards::{run_all_guards, GuardOutcome, RateConfig};
//! use libfcast::state::StateStore;
//!
//! let mut state = StateStore::open("/tmp/fcast-state.json", 50);
//! match run_all_guards("gm frens", Some(&mut state), &RateConfig::default()) {
//!     GuardOutcome::Pass => println!("clear to post"),
//!     GuardOutcome::Reject(rejection) => eprintln!("blocked: {}", rejection),
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::state::{now_millis, StateStore};

pub mod content;
pub mod pii;
pub mod rate;
mod wordlist;

pub use rate::RateConfig;

/// Which guard produced a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    Content,
    Pii,
    RateLimit,
    /// Per-target cooldown requested by the caller.
    Cooldown,
}

impl std::fmt::Display for GuardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardKind::Content => write!(f, "content"),
            GuardKind::Pii => write!(f, "pii"),
            GuardKind::RateLimit => write!(f, "rate_limit"),
            GuardKind::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// A guard's veto, with a reason meant for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub guard: GuardKind,
    pub reason: String,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Pass,
    Reject(Rejection),
}

impl GuardOutcome {
    pub fn reject(guard: GuardKind, reason: impl Into<String>) -> Self {
        GuardOutcome::Reject(Rejection {
            guard,
            reason: reason.into(),
        })
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, GuardOutcome::Pass)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            GuardOutcome::Pass => None,
            GuardOutcome::Reject(r) => Some(&r.reason),
        }
    }

    /// Run `next` only if this outcome passed.
    pub fn and_then(self, next: impl FnOnce() -> GuardOutcome) -> GuardOutcome {
        match self {
            GuardOutcome::Pass => next(),
            reject => reject,
        }
    }
}

/// Run every guard against `text`.
///
/// Without a state store the duplicate check and the rate limiter are skipped.
pub fn run_all_guards(text: &str, state: Option<&mut StateStore>, rate: &RateConfig) -> GuardOutcome {
    run_all_guards_at(text, state, rate, now_millis())
}

pub fn run_all_guards_at(
    text: &str,
    state: Option<&mut StateStore>,
    rate: &RateConfig,
    now: i64,
) -> GuardOutcome {
    content::validate_at(text, state.as_deref(), now)
        .and_then(|| pii::filter(text))
        .and_then(|| rate::check_at(state, rate, now))
}
