//! Ed25519 app-key signer
//!
//! Loads the signer key file written at key registration time:
//!
//! ```json
//! { "fid": 1234, "signerPrivateKey": "0x<64 hex chars>" }
//! ```
//!
//! Messages are wrapped in a JSON envelope carrying the message data, a
//! 20-byte SHA-256 hash of that data, and an Ed25519 signature over the hash.

use std::path::Path;

use ed25519_dalek::{Signer as _, SigningKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::CastSigner;
use crate::error::{HubError, Result};
use crate::types::{CastBody, SignedMessage};

/// Unix time of the protocol epoch (2021-01-01T00:00:00Z).
pub const FARCASTER_EPOCH: i64 = 1_609_459_200;

const HASH_LEN: usize = 20;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyFile {
    fid: Option<u64>,
    signer_private_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    fid: u64,
    timestamp: u32,
    network: &'static str,
    cast_add_body: &'a CastBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    data: MessageData<'a>,
    hash: String,
    hash_scheme: &'static str,
    signature: String,
    signature_scheme: &'static str,
    signer: String,
}

/// Seconds since the protocol epoch.
pub fn farcaster_time(unix_secs: i64) -> u32 {
    u32::try_from(unix_secs - FARCASTER_EPOCH).unwrap_or(0)
}

fn signer_error(msg: impl Into<String>) -> HubError {
    HubError::Signer(msg.into())
}

pub struct Ed25519Signer {
    fid: u64,
    key: SigningKey,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("fid", &self.fid)
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

impl Ed25519Signer {
    pub fn new(fid: u64, key: SigningKey) -> Self {
        Self { fid, key }
    }

    /// Parse a hex private key, with or without `0x`.
    pub fn from_hex(fid: u64, hex_key: &str) -> Result<Self> {
        let stripped = hex_key.trim().trim_start_matches("0x");
        let bytes = Zeroizing::new(
            hex::decode(stripped).map_err(|e| signer_error(format!("invalid key hex: {}", e)))?,
        );
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| signer_error(format!("expected 32-byte key, got {} bytes", bytes.len())))?;
        Ok(Self::new(fid, SigningKey::from_bytes(&secret)))
    }

    /// Load the key file at `path`. `fid_override` wins over the file's FID.
    pub fn from_file(path: &Path, fid_override: Option<u64>) -> Result<Self> {
        let content = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            signer_error(format!("failed to read {}: {}", path.display(), e))
        })?);
        let file: KeyFile = serde_json::from_str(&content)
            .map_err(|e| signer_error(format!("invalid key file {}: {}", path.display(), e)))?;
        let hex_key = Zeroizing::new(file.signer_private_key);

        let fid = fid_override
            .or(file.fid)
            .ok_or_else(|| signer_error("no FID in key file, config, or environment"))?;

        Self::from_hex(fid, &hex_key)
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.verifying_key().as_bytes()))
    }

    /// Sign with an explicit Unix timestamp.
    pub fn sign_at(&self, body: &CastBody, unix_secs: i64) -> Result<SignedMessage> {
        let data = MessageData {
            kind: "MESSAGE_TYPE_CAST_ADD",
            fid: self.fid,
            timestamp: farcaster_time(unix_secs),
            network: "FARCASTER_NETWORK_MAINNET",
            cast_add_body: body,
        };

        let data_bytes = serde_json::to_vec(&data)
            .map_err(|e| signer_error(format!("failed to encode message: {}", e)))?;
        let digest = Sha256::digest(&data_bytes);
        let hash = &digest[..HASH_LEN];
        let signature = self.key.sign(hash);

        let hash_hex = format!("0x{}", hex::encode(hash));
        let envelope = Envelope {
            data,
            hash: hash_hex.clone(),
            hash_scheme: "HASH_SCHEME_SHA256_160",
            signature: hex::encode(signature.to_bytes()),
            signature_scheme: "SIGNATURE_SCHEME_ED25519",
            signer: self.public_key_hex(),
        };

        let bytes = serde_json::to_vec(&envelope)
            .map_err(|e| signer_error(format!("failed to encode envelope: {}", e)))?;

        Ok(SignedMessage {
            bytes,
            hash: hash_hex,
        })
    }
}

impl CastSigner for Ed25519Signer {
    fn fid(&self) -> u64 {
        self.fid
    }

    fn sign(&self, body: &CastBody) -> Result<SignedMessage> {
        self.sign_at(body, chrono::Utc::now().timestamp())
    }
}
