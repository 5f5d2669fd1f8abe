//! Service layer for fcast
//!
//! `FcastService` is the single entry point the binaries use. It owns the
//! [`StateStore`] and coordinates the guard pipeline with the signer and the
//! submission endpoint. Read-only queries live in the [`Reader`] sub-service,
//! which needs no signer and never touches local state.
//!
//! # Posting flow
//!
//! 1. Guards (content, PII, rate limit, then any per-target cooldown).
//!    A rejection returns before any network call.
//! 2. Sign the cast body.
//! 3. Submit the signed message.
//! 4. Record the cast in the state store and set the cooldown, if any.
//!
//! # Example
//!
//! ```no_run
//! use libfcast::service::FcastService;
//! use libfcast::types::CastOptions;
//! use libfcast::Config;
//!
//! # async fn example() -> libfcast::Result<()> {
//! let config = Config::load()?;
//! let mut service = FcastService::from_config(&config, None)?;
//!
//! let outcome = service.post("shipped it", CastOptions::default()).await;
//! println!("{}", outcome.to_json());
//! # Ok(())
//! # }
//! ```

pub mod reader;

pub use reader::{parse_age, Reader, SearchOptions};

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::error::Result;
use crate::guards::{run_all_guards_at, GuardKind, GuardOutcome, RateConfig};
use crate::hub::neynar::NeynarHub;
use crate::hub::signer::Ed25519Signer;
use crate::hub::{CastSigner, QueryService, Submitter};
use crate::state::{now_millis, StateStore};
use crate::types::{
    CastBody, CastOptions, PostMeta, PostOutcome, PostStage, ReplyTarget, TargetCooldown,
};

/// Main service facade
pub struct FcastService {
    state: StateStore,
    rate: RateConfig,
    guards_enabled: bool,
    signer: Arc<dyn CastSigner>,
    submitter: Arc<dyn Submitter>,
    reader: Reader,
    clock: fn() -> i64,
}

impl FcastService {
    /// Assemble a service from explicit collaborators.
    ///
    /// Guards start enabled with the default rate limits.
    pub fn new(
        state: StateStore,
        signer: Arc<dyn CastSigner>,
        submitter: Arc<dyn Submitter>,
        query: Arc<dyn QueryService>,
    ) -> Self {
        let reader = Reader::new(query, Some(signer.fid()));
        Self {
            state,
            rate: RateConfig::default(),
            guards_enabled: true,
            signer,
            submitter,
            reader,
            clock: now_millis,
        }
    }

    /// Build the production service: state file, Neynar client, and the
    /// Ed25519 signer from the key file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No API key is configured
    /// - The signer key file is missing or malformed
    /// - The HTTP client cannot be created
    pub fn from_config(config: &Config, state_path: Option<&str>) -> Result<Self> {
        let state_path = config::resolve_state_path(state_path, config)?;
        let state = StateStore::open(state_path, config.state.history_size);

        let api_key = config::resolve_api_key(config)?;
        let hub = Arc::new(NeynarHub::new(&config.hub, api_key)?);

        let key_path = config::resolve_signer_key_path(config)?;
        let signer = Ed25519Signer::from_file(&key_path, config::resolve_fid(config))?;

        Ok(Self::new(state, Arc::new(signer), hub.clone(), hub)
            .with_rate_config(config.guards.rate_config())
            .with_guards(config.guards.enabled))
    }

    pub fn with_rate_config(mut self, rate: RateConfig) -> Self {
        self.rate = rate;
        self
    }

    /// Disabling guards skips the whole pipeline, cooldowns included.
    pub fn with_guards(mut self, enabled: bool) -> Self {
        self.guards_enabled = enabled;
        self
    }

    /// Replace the wall clock (milliseconds since the Unix epoch).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn guards_enabled(&self) -> bool {
        self.guards_enabled
    }

    pub fn fid(&self) -> u64 {
        self.signer.fid()
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateStore {
        &mut self.state
    }

    /// Access the read-only query service
    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Guards plus the per-target cooldown, first rejection wins.
    fn check_guards(
        &mut self,
        text: &str,
        cooldown: Option<&TargetCooldown>,
        now: i64,
    ) -> GuardOutcome {
        let state = &mut self.state;
        run_all_guards_at(text, Some(&mut *state), &self.rate, now).and_then(|| match cooldown {
            Some(target) if state.is_on_cooldown_at(&target.key, now) => GuardOutcome::reject(
                GuardKind::Cooldown,
                format!("Target '{}' is on cooldown", target.key),
            ),
            _ => GuardOutcome::Pass,
        })
    }

    /// Publish a cast.
    ///
    /// Never returns an error: guard rejections and external failures are
    /// reported through [`PostOutcome`]. State is only written after the hub
    /// accepted the cast.
    pub async fn post(&mut self, text: &str, options: CastOptions) -> PostOutcome {
        let now = (self.clock)();

        if self.guards_enabled {
            if let GuardOutcome::Reject(rejection) =
                self.check_guards(text, options.cooldown.as_ref(), now)
            {
                info!(guard = %rejection.guard, reason = %rejection.reason, "Cast rejected");
                return PostOutcome::Rejected {
                    guard: rejection.guard,
                    reason: rejection.reason,
                };
            }
        }

        let body = CastBody::new(text, &options);
        let message = match self.signer.sign(&body) {
            Ok(message) => message,
            Err(e) => {
                warn!("Signing failed: {}", e);
                return PostOutcome::Failed {
                    stage: PostStage::Sign,
                    reason: format!("Cast creation failed: {}", e),
                };
            }
        };

        let receipt = match self.submitter.submit(&message).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Submit failed: {}", e);
                return PostOutcome::Failed {
                    stage: PostStage::Submit,
                    reason: format!("Hub submit failed: {}", e),
                };
            }
        };

        // The cast is live at this point; a local write failure must not be
        // reported as a failed post or the caller may publish it twice.
        let meta = PostMeta {
            channel: options.channel.clone(),
            reply_to: options.reply_to.as_ref().map(|r| r.hash.clone()),
        };
        if let Err(e) = self.state.record_post_at(text, &receipt.hash, meta, now) {
            warn!("Cast {} posted but not recorded: {}", receipt.hash, e);
        }
        if let Some(target) = options.cooldown {
            if let Err(e) = self.state.set_cooldown_at(&target.key, target.duration, now) {
                warn!("Failed to set cooldown for {}: {}", target.key, e);
            }
        }

        info!(hash = %receipt.hash, "Cast posted");
        PostOutcome::Posted {
            hash: receipt.hash,
            data: receipt.data,
        }
    }

    /// Reply to the cast `parent_hash` by `parent_fid`.
    pub async fn reply(
        &mut self,
        parent_hash: &str,
        parent_fid: u64,
        text: &str,
        options: CastOptions,
    ) -> PostOutcome {
        let options = CastOptions {
            reply_to: Some(ReplyTarget {
                hash: parent_hash.to_string(),
                fid: parent_fid,
            }),
            ..options
        };
        self.post(text, options).await
    }

    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<Value>> {
        self.reader.search(query, options).await
    }

    pub async fn notifications(&self, fid: Option<u64>, limit: usize) -> Result<Vec<Value>> {
        self.reader.notifications(fid, limit).await
    }

    pub async fn user(&self, fid: u64) -> Result<Option<Value>> {
        self.reader.user(fid).await
    }

    pub async fn user_by_name(&self, username: &str) -> Result<Option<Value>> {
        self.reader.user_by_name(username).await
    }

    pub async fn feed(&self, fid: u64, limit: usize) -> Result<Vec<Value>> {
        self.reader.feed(fid, limit).await
    }

    pub async fn trending(&self, channel: Option<&str>, limit: usize) -> Result<Vec<Value>> {
        self.reader.trending(channel, limit).await
    }

    pub async fn thread(&self, hash: &str) -> Result<Option<Value>> {
        self.reader.thread(hash).await
    }
}
