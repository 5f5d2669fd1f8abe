//! Mock collaborators for testing
//!
//! Configurable doubles for the signer, the submission endpoint, and the
//! query service. They record every call so tests can assert that a rejected
//! cast never reached the network. Compiled for all builds so integration
//! tests can use them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{CastSigner, QueryService, Submitter};
use crate::error::{HubError, Result};
use crate::types::{CastBody, SignedMessage, SubmitReceipt};

/// Signer that produces predictable hashes, or fails on demand.
#[derive(Debug, Clone)]
pub struct MockSigner {
    pub fid: u64,
    pub error: Option<String>,
    pub signed: Arc<Mutex<Vec<CastBody>>>,
}

impl MockSigner {
    pub fn new(fid: u64) -> Self {
        Self {
            fid,
            error: None,
            signed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(1)
        }
    }

    pub fn sign_count(&self) -> usize {
        self.signed.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl CastSigner for MockSigner {
    fn fid(&self) -> u64 {
        self.fid
    }

    fn sign(&self, body: &CastBody) -> Result<SignedMessage> {
        if let Some(ref error) = self.error {
            return Err(HubError::Signer(error.clone()).into());
        }

        let mut signed = self
            .signed
            .lock()
            .map_err(|_| HubError::Signer("mock lock poisoned".to_string()))?;
        signed.push(body.clone());

        Ok(SignedMessage {
            bytes: body.text.as_bytes().to_vec(),
            hash: format!("0x{:040x}", signed.len()),
        })
    }
}

/// How the mock submission endpoint answers.
#[derive(Debug, Clone)]
pub enum SubmitBehavior {
    /// Accept and echo the message hash.
    Accept,
    /// Respond with a non-success status.
    Status { status: u16, body: String },
    /// Fail before a response arrives.
    Network(String),
}

/// Submission endpoint and query service in one.
#[derive(Debug, Clone)]
pub struct MockHub {
    pub submit_behavior: SubmitBehavior,
    /// Canned query responses keyed by path. Unknown paths return 404.
    pub responses: HashMap<String, Value>,
    pub submitted: Arc<Mutex<Vec<SignedMessage>>>,
    pub queries: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

impl Default for MockHub {
    fn default() -> Self {
        Self {
            submit_behavior: SubmitBehavior::Accept,
            responses: HashMap::new(),
            submitted: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            submit_behavior: SubmitBehavior::Status {
                status,
                body: body.to_string(),
            },
            ..Self::default()
        }
    }

    pub fn with_response(mut self, path: &str, value: Value) -> Self {
        self.responses.insert(path.to_string(), value);
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Parameters of the most recent query, if any.
    pub fn last_query(&self) -> Option<(String, Vec<(String, String)>)> {
        self.queries.lock().ok().and_then(|q| q.last().cloned())
    }
}

#[async_trait]
impl Submitter for MockHub {
    async fn submit(&self, message: &SignedMessage) -> Result<SubmitReceipt> {
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(message.clone());
        }

        match &self.submit_behavior {
            SubmitBehavior::Accept => Ok(SubmitReceipt {
                hash: message.hash.clone(),
                data: json!({ "hash": message.hash }),
            }),
            SubmitBehavior::Status { status, body } => Err(HubError::Status {
                path: "Hub submit".to_string(),
                status: *status,
                body: body.clone(),
            }
            .into()),
            SubmitBehavior::Network(msg) => Err(HubError::Network(msg.clone()).into()),
        }
    }
}

#[async_trait]
impl QueryService for MockHub {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((
                path.to_string(),
                params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
        }

        self.responses.get(path).cloned().ok_or_else(|| {
            HubError::Status {
                path: format!("Neynar {}", path),
                status: 404,
                body: "not found".to_string(),
            }
            .into()
        })
    }
}
