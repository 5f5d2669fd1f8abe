//! fcast - guarded command-line client for Farcaster
//!
//! This library holds everything the `fcast-*` tools share: the persistent
//! state store, the guard pipeline that gates every outbound cast, and the
//! client facade that signs, submits, and records casts.

pub mod config;
pub mod error;
pub mod guards;
pub mod hub;
pub mod logging;
pub mod service;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{FcastError, Result};
pub use guards::{run_all_guards, GuardKind, GuardOutcome, RateConfig, Rejection};
pub use service::FcastService;
pub use state::StateStore;
pub use types::{CastOptions, PostOutcome, PostRecord, ReplyTarget, TargetCooldown};
