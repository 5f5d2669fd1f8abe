//! Persistent state: recent casts, rate windows, and per-target cooldowns
//!
//! The whole structure lives in one JSON file that is read once when the
//! store is opened and rewritten in full after every mutation. Two processes
//! sharing a file race on that rewrite and the last writer wins; callers that
//! need multi-process safety must serialize access themselves.
//!
//! Every time-dependent operation has an `_at` variant taking "now" in
//! milliseconds since the Unix epoch. The plain variants sample the wall clock
//! and delegate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, StateError};
use crate::types::{PostMeta, PostRecord};

pub const DEFAULT_HISTORY_SIZE: usize = 50;

/// Window used by the duplicate check when the caller has no preference.
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_secs(3600);

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

fn normalize(text: &str) -> String {
    crate::guards::content::trim_cast(text).to_lowercase()
}

/// On-disk layout of the state file.
///
/// `posts` is serialized as `casts` for compatibility with existing files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Newest first.
    #[serde(rename = "casts", default)]
    pub posts: Vec<PostRecord>,
    /// Expiry instant (ms) per cooldown key.
    #[serde(default)]
    pub cooldowns: BTreeMap<String, i64>,
    /// One timestamp (ms) per successful post, oldest first.
    #[serde(default)]
    pub rate_windows: Vec<i64>,
}

impl PersistedState {
    /// Read the state file, falling back to an empty state on any failure.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No readable state at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "State file {} is corrupt ({}), starting with empty state",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Drop rate-window entries at or before `cutoff`. Order is preserved.
    pub fn prune_rate_windows(&mut self, cutoff: i64) -> bool {
        let before = self.rate_windows.len();
        self.rate_windows.retain(|&t| t > cutoff);
        self.rate_windows.len() != before
    }

    /// Whether a post with the same normalized text landed after `cutoff`.
    pub fn has_post_since(&self, text: &str, cutoff: i64) -> bool {
        let normalized = normalize(text);
        self.posts
            .iter()
            .any(|p| p.timestamp > cutoff && normalize(&p.text) == normalized)
    }
}

/// File-backed store for posting history and rate-limit bookkeeping.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    history_size: usize,
    data: PersistedState,
}

impl StateStore {
    /// Open the store at `path`, loading whatever is there.
    ///
    /// A `history_size` of zero means the default of 50.
    pub fn open(path: impl Into<PathBuf>, history_size: usize) -> Self {
        let path = path.into();
        let data = PersistedState::load(&path);
        let history_size = if history_size == 0 {
            DEFAULT_HISTORY_SIZE
        } else {
            history_size
        };

        debug!(
            "Opened state at {} ({} casts, {} cooldowns)",
            path.display(),
            data.posts.len(),
            data.cooldowns.len()
        );

        Self {
            path,
            history_size,
            data,
        }
    }

    /// Re-read the state file, discarding in-memory changes.
    pub fn load(&mut self) {
        self.data = PersistedState::load(&self.path);
    }

    /// Rewrite the state file in full.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                // A failure here surfaces as the write error below.
                let _ = std::fs::create_dir_all(parent);
            }
        }

        let json = serde_json::to_string_pretty(&self.data).map_err(StateError::Serialize)?;
        std::fs::write(&self.path, json).map_err(|source| StateError::Write {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Persist after lazy cleanup. A failed write only costs the cleanup.
    fn save_best_effort(&self) {
        if let Err(e) = self.save() {
            warn!("Failed to persist pruned state: {}", e);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }

    pub fn data(&self) -> &PersistedState {
        &self.data
    }

    /// Record a cast that was accepted by the hub.
    pub fn record_post(&mut self, text: &str, external_id: &str, meta: PostMeta) -> Result<()> {
        self.record_post_at(text, external_id, meta, now_millis())
    }

    pub fn record_post_at(
        &mut self,
        text: &str,
        external_id: &str,
        meta: PostMeta,
        now: i64,
    ) -> Result<()> {
        self.data.posts.insert(
            0,
            PostRecord {
                text: text.to_string(),
                external_id: external_id.to_string(),
                timestamp: now,
                channel: meta.channel,
                reply_to: meta.reply_to,
            },
        );
        self.data.posts.truncate(self.history_size);
        self.data.rate_windows.push(now);
        self.save()
    }

    /// Whether `text` matches a recorded cast within `window`, ignoring case
    /// and surrounding whitespace.
    pub fn is_duplicate(&self, text: &str, window: Duration) -> bool {
        self.is_duplicate_at(text, window, now_millis())
    }

    pub fn is_duplicate_at(&self, text: &str, window: Duration, now: i64) -> bool {
        self.data
            .has_post_since(text, now.saturating_sub(duration_millis(window)))
    }

    /// The `n` most recent casts, newest first.
    pub fn recent_posts(&self, n: usize) -> &[PostRecord] {
        let end = n.min(self.data.posts.len());
        &self.data.posts[..end]
    }

    /// Start (or restart) a cooldown for `key`.
    pub fn set_cooldown(&mut self, key: &str, duration: Duration) -> Result<()> {
        self.set_cooldown_at(key, duration, now_millis())
    }

    pub fn set_cooldown_at(&mut self, key: &str, duration: Duration, now: i64) -> Result<()> {
        let until = now.saturating_add(duration_millis(duration));
        self.data.cooldowns.insert(key.to_string(), until);
        self.save()
    }

    /// Whether `key` is still cooling down. An expired entry is removed.
    pub fn is_on_cooldown(&mut self, key: &str) -> bool {
        self.is_on_cooldown_at(key, now_millis())
    }

    pub fn is_on_cooldown_at(&mut self, key: &str, now: i64) -> bool {
        let Some(&until) = self.data.cooldowns.get(key) else {
            return false;
        };

        if now >= until {
            self.data.cooldowns.remove(key);
            self.save_best_effort();
            return false;
        }
        true
    }

    /// Number of posts within `window`, pruning older entries.
    pub fn posts_in_window(&mut self, window: Duration) -> usize {
        self.posts_in_window_at(window, now_millis())
    }

    pub fn posts_in_window_at(&mut self, window: Duration, now: i64) -> usize {
        let cutoff = now.saturating_sub(duration_millis(window));
        if self.data.prune_rate_windows(cutoff) {
            self.save_best_effort();
        }
        self.data.rate_windows.len()
    }
}
