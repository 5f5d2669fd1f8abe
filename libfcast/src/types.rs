//! Core types for fcast

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::guards::GuardKind;

/// A cast this client published, as kept in the local history.
///
/// The external id is stored under `hash` so state files written by earlier
/// clients keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    /// Empty when the hub returned no hash.
    #[serde(rename = "hash", default)]
    pub external_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// Metadata recorded alongside a post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMeta {
    pub channel: Option<String>,
    pub reply_to: Option<String>,
}

/// Identifies the cast being replied to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyTarget {
    pub hash: String,
    pub fid: u64,
}

impl ReplyTarget {
    /// Parse the `hash:fid` shorthand used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        let (hash, fid) = s.split_once(':')?;
        let fid = fid.trim().parse().ok()?;
        let hash = hash.trim();
        if hash.is_empty() {
            return None;
        }
        Some(Self {
            hash: hash.to_string(),
            fid,
        })
    }
}

/// Suppress further posts against `key` for `duration` once this one lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCooldown {
    pub key: String,
    pub duration: Duration,
}

/// Options accepted by [`FcastService::post`](crate::service::FcastService::post).
#[derive(Debug, Clone, Default)]
pub struct CastOptions {
    pub channel: Option<String>,
    pub embeds: Vec<String>,
    pub reply_to: Option<ReplyTarget>,
    pub cooldown: Option<TargetCooldown>,
}

/// Content handed to the signer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CastBody {
    pub text: String,
    pub embeds: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_cast_id: Option<ReplyTarget>,
}

impl CastBody {
    pub fn new(text: &str, options: &CastOptions) -> Self {
        Self {
            text: text.to_string(),
            embeds: options.embeds.clone(),
            parent_url: options.channel.as_deref().map(channel_url),
            parent_cast_id: options.reply_to.clone(),
        }
    }
}

/// Parent URL that scopes a cast to a channel.
pub fn channel_url(channel: &str) -> String {
    format!("https://warpcast.com/~/channel/{}", channel)
}

/// A signed, serialized message ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub bytes: Vec<u8>,
    /// Hex message hash with `0x` prefix.
    pub hash: String,
}

/// What the submission endpoint returned for an accepted message.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub hash: String,
    pub data: serde_json::Value,
}

/// Which external step failed while posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStage {
    Sign,
    Submit,
}

impl std::fmt::Display for PostStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStage::Sign => write!(f, "sign"),
            PostStage::Submit => write!(f, "submit"),
        }
    }
}

/// Result of a post attempt.
#[derive(Debug, Clone)]
pub enum PostOutcome {
    Posted {
        hash: String,
        data: serde_json::Value,
    },
    Rejected {
        guard: GuardKind,
        reason: String,
    },
    Failed {
        stage: PostStage,
        reason: String,
    },
}

impl PostOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, PostOutcome::Posted { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            PostOutcome::Posted { .. } => None,
            PostOutcome::Rejected { reason, .. } | PostOutcome::Failed { reason, .. } => {
                Some(reason)
            }
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            PostOutcome::Posted { hash, .. } => Some(hash),
            _ => None,
        }
    }

    /// `{ok, hash, data}` on success, `{ok, reason, ...}` otherwise.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PostOutcome::Posted { hash, data } => json!({
                "ok": true,
                "hash": hash,
                "data": data,
            }),
            PostOutcome::Rejected { guard, reason } => json!({
                "ok": false,
                "guard": guard.to_string(),
                "reason": reason,
            }),
            PostOutcome::Failed { stage, reason } => json!({
                "ok": false,
                "stage": stage.to_string(),
                "reason": reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_record_uses_legacy_field_names() {
        let record = PostRecord {
            text: "gm".to_string(),
            external_id: "0xabc".to_string(),
            timestamp: 1_700_000_000_000,
            channel: Some("rust".to_string()),
            reply_to: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["hash"], "0xabc");
        assert_eq!(value["replyTo"], serde_json::Value::Null);
        assert_eq!(value["channel"], "rust");
        assert!(value.get("externalId").is_none());
    }

    #[test]
    fn test_post_record_tolerates_missing_optional_fields() {
        let record: PostRecord =
            serde_json::from_str(r#"{"text":"gm","hash":"0x1","timestamp":5}"#).unwrap();
        assert_eq!(record.channel, None);
        assert_eq!(record.reply_to, None);
    }

    #[test]
    fn test_reply_target_parse() {
        let target = ReplyTarget::parse("0xdeadbeef:3").unwrap();
        assert_eq!(target.hash, "0xdeadbeef");
        assert_eq!(target.fid, 3);

        assert!(ReplyTarget::parse("0xdeadbeef").is_none());
        assert!(ReplyTarget::parse("0xdeadbeef:abc").is_none());
        assert!(ReplyTarget::parse(":3").is_none());
    }

    #[test]
    fn test_cast_body_maps_channel_and_reply() {
        let options = CastOptions {
            channel: Some("rust".to_string()),
            embeds: vec!["https://example.com".to_string()],
            reply_to: Some(ReplyTarget {
                hash: "0x01".to_string(),
                fid: 9,
            }),
            cooldown: None,
        };
        let body = CastBody::new("hello", &options);

        assert_eq!(
            body.parent_url.as_deref(),
            Some("https://warpcast.com/~/channel/rust")
        );
        assert_eq!(body.parent_cast_id.as_ref().map(|p| p.fid), Some(9));
        assert_eq!(body.embeds.len(), 1);
    }

    #[test]
    fn test_outcome_json_shapes() {
        let posted = PostOutcome::Posted {
            hash: "0x1".to_string(),
            data: json!({"hash": "0x1"}),
        };
        assert_eq!(posted.to_json()["ok"], true);
        assert_eq!(posted.hash(), Some("0x1"));

        let rejected = PostOutcome::Rejected {
            guard: GuardKind::Pii,
            reason: "pii".to_string(),
        };
        let value = rejected.to_json();
        assert_eq!(value["ok"], false);
        assert_eq!(value["guard"], "pii");
        assert_eq!(rejected.reason(), Some("pii"));

        let failed = PostOutcome::Failed {
            stage: PostStage::Submit,
            reason: "502".to_string(),
        };
        assert_eq!(failed.to_json()["stage"], "submit");
        assert!(!failed.is_ok());
    }
}
