//! Read-only queries against the social graph API
//!
//! Nothing here touches the state store or runs guards. Responses are passed
//! through as JSON; the only client-side processing is the optional
//! follower/age filtering applied to search results.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::{self, Config};
use crate::error::{FcastError, Result};
use crate::hub::neynar::NeynarHub;
use crate::hub::QueryService;
use crate::state::{duration_millis, now_millis};

pub const DEFAULT_LIMIT: usize = 25;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);
const THREAD_REPLY_DEPTH: u32 = 5;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Drop casts whose author has fewer followers.
    pub min_followers: Option<u64>,
    /// Shorthand age such as `6h`, `30m`, or `2d`.
    pub max_age: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            min_followers: None,
            max_age: None,
        }
    }
}

/// Parse `<n>m`, `<n>h`, or `<n>d`. Anything else means 24 hours.
pub fn parse_age(s: &str) -> Duration {
    let s = s.trim();
    let Some(unit) = s.chars().last() else {
        return DEFAULT_MAX_AGE;
    };
    let digits = &s[..s.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_MAX_AGE;
    }
    let Ok(n) = digits.parse::<u64>() else {
        return DEFAULT_MAX_AGE;
    };

    match unit {
        'm' => Duration::from_secs(n.saturating_mul(60)),
        'h' => Duration::from_secs(n.saturating_mul(3600)),
        'd' => Duration::from_secs(n.saturating_mul(86_400)),
        _ => DEFAULT_MAX_AGE,
    }
}

fn follower_count(cast: &Value) -> u64 {
    cast.pointer("/author/follower_count")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

fn cast_timestamp_millis(cast: &Value) -> Option<i64> {
    let raw = cast.get("timestamp")?.as_str()?;
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Apply the follower and age cutoffs. Casts without a parseable timestamp
/// are dropped when an age cutoff is set.
pub fn filter_casts(casts: Vec<Value>, options: &SearchOptions, now: i64) -> Vec<Value> {
    let cutoff = options
        .max_age
        .as_deref()
        .map(|age| now.saturating_sub(duration_millis(parse_age(age))));

    casts
        .into_iter()
        .filter(|cast| {
            options
                .min_followers
                .map_or(true, |min| follower_count(cast) >= min)
        })
        .filter(|cast| match cutoff {
            Some(cutoff) => cast_timestamp_millis(cast).is_some_and(|ts| ts > cutoff),
            None => true,
        })
        .collect()
}

fn array_at(data: &Value, pointer: &str) -> Vec<Value> {
    data.pointer(pointer)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// Read-side sub-service.
#[derive(Clone)]
pub struct Reader {
    query: Arc<dyn QueryService>,
    default_fid: Option<u64>,
}

impl Reader {
    pub fn new(query: Arc<dyn QueryService>, default_fid: Option<u64>) -> Self {
        Self { query, default_fid }
    }

    /// Neynar-backed reader. Only the API key is required; the default FID
    /// comes from `FARCASTER_FID` or the config file when set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config::resolve_api_key(config)?;
        let hub = NeynarHub::new(&config.hub, api_key)?;
        Ok(Self::new(Arc::new(hub), config::resolve_fid(config)))
    }

    pub fn default_fid(&self) -> Option<u64> {
        self.default_fid
    }

    /// Full-text cast search with optional client-side filtering.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<Value>> {
        let data = self
            .query
            .get(
                "/cast/search",
                &[("q", query.to_string()), ("limit", options.limit.to_string())],
            )
            .await?;

        let casts = array_at(&data, "/result/casts");
        let total = casts.len();
        let kept = filter_casts(casts, options, now_millis());
        debug!("Search returned {} casts, {} after filtering", total, kept.len());
        Ok(kept)
    }

    /// Notifications for `fid`, or for the signer's own FID.
    pub async fn notifications(&self, fid: Option<u64>, limit: usize) -> Result<Vec<Value>> {
        let fid = fid.or(self.default_fid).ok_or_else(|| {
            FcastError::InvalidInput("No FID given and none configured".to_string())
        })?;

        let data = self
            .query
            .get(
                "/notifications",
                &[("fid", fid.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(array_at(&data, "/notifications"))
    }

    pub async fn user(&self, fid: u64) -> Result<Option<Value>> {
        let data = self
            .query
            .get("/user/bulk", &[("fids", fid.to_string())])
            .await?;
        Ok(non_null(data.pointer("/users/0")))
    }

    pub async fn user_by_name(&self, username: &str) -> Result<Option<Value>> {
        let data = self
            .query
            .get("/user/by_username", &[("username", username.to_string())])
            .await?;
        Ok(non_null(data.get("user")))
    }

    /// Accept either a numeric FID or a username.
    pub async fn resolve_fid(&self, target: &str) -> Result<Option<u64>> {
        let target = target.trim();
        if !target.is_empty() && target.bytes().all(|b| b.is_ascii_digit()) {
            return target
                .parse()
                .map(Some)
                .map_err(|_| FcastError::InvalidInput(format!("FID out of range: {}", target)));
        }

        let user = self.user_by_name(target.trim_start_matches('@')).await?;
        Ok(user.and_then(|u| u.get("fid").and_then(Value::as_u64)))
    }

    /// Casts authored by `fid`, newest first.
    pub async fn feed(&self, fid: u64, limit: usize) -> Result<Vec<Value>> {
        let data = self
            .query
            .get(
                "/feed/user/casts",
                &[("fid", fid.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(array_at(&data, "/casts"))
    }

    /// Trending casts over the last 24 hours, optionally within a channel.
    pub async fn trending(&self, channel: Option<&str>, limit: usize) -> Result<Vec<Value>> {
        let mut params = vec![
            ("limit", limit.to_string()),
            ("time_window", "24h".to_string()),
        ];
        if let Some(channel) = channel {
            params.push(("channel_id", channel.to_string()));
        }

        let data = self.query.get("/feed/trending", &params).await?;
        Ok(array_at(&data, "/casts"))
    }

    /// Conversation around `hash`, including parent casts.
    pub async fn thread(&self, hash: &str) -> Result<Option<Value>> {
        let data = self
            .query
            .get(
                "/cast/conversation",
                &[
                    ("identifier", hash.to_string()),
                    ("type", "hash".to_string()),
                    ("reply_depth", THREAD_REPLY_DEPTH.to_string()),
                    ("include_chronological_parent_casts", "true".to_string()),
                ],
            )
            .await?;
        Ok(non_null(data.get("conversation")))
    }
}
