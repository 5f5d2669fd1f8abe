//! Collaborators that talk to the network
//!
//! The service facade only depends on these traits. [`neynar::NeynarHub`]
//! is the production implementation; [`mock`] provides configurable doubles
//! for tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{CastBody, SignedMessage, SubmitReceipt};

pub mod mock;
pub mod neynar;
pub mod signer;

/// Turns cast content into a signed message for the author's FID.
pub trait CastSigner: Send + Sync {
    fn fid(&self) -> u64;

    /// # Errors
    ///
    /// Returns `HubError::Signer` if the message cannot be built or signed.
    fn sign(&self, body: &CastBody) -> Result<SignedMessage>;
}

/// Accepts signed messages.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit a signed message and return the id the hub assigned.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Status` for non-success responses and
    /// `HubError::Network` when the endpoint cannot be reached in time.
    async fn submit(&self, message: &SignedMessage) -> Result<SubmitReceipt>;
}

/// Read-only access to the social graph API.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// GET `path` with the given query parameters.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Status` (with status and body text) for non-2xx
    /// responses.
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value>;
}
