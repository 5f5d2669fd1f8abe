//! Posting rate limiter
//!
//! Two limits, both computed from the state store: a cap on casts in the last
//! hour and a minimum gap since the most recent cast.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{GuardKind, GuardOutcome};
use crate::state::StateStore;

const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    pub max_per_hour: usize,
    pub min_interval_ms: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            max_per_hour: 30,
            min_interval_ms: 30_000,
        }
    }
}

/// Check both limits. Passes when there is no state to consult.
pub fn check(state: Option<&mut StateStore>, config: &RateConfig) -> GuardOutcome {
    check_at(state, config, crate::state::now_millis())
}

pub fn check_at(state: Option<&mut StateStore>, config: &RateConfig, now: i64) -> GuardOutcome {
    let Some(state) = state else {
        return GuardOutcome::Pass;
    };

    let last_hour = state.posts_in_window_at(HOUR, now);
    if last_hour >= config.max_per_hour {
        return GuardOutcome::reject(
            GuardKind::RateLimit,
            format!(
                "Rate limit: {}/{} casts in the last hour",
                last_hour, config.max_per_hour
            ),
        );
    }

    if let Some(latest) = state.recent_posts(1).first() {
        // A timestamp from the future yields a negative gap
        let elapsed = now.saturating_sub(latest.timestamp);
        let min_interval = i64::try_from(config.min_interval_ms).unwrap_or(i64::MAX);
        if elapsed < min_interval {
            let wait_ms = min_interval.saturating_sub(elapsed);
            let wait_secs = wait_ms.saturating_add(999) / 1000;
            return GuardOutcome::reject(
                GuardKind::RateLimit,
                format!("Cooldown: wait {}s before next cast", wait_secs),
            );
        }
    }

    GuardOutcome::Pass
}
