//! HTTP client for the Neynar API and hub submission endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use super::{QueryService, Submitter};
use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::types::{SignedMessage, SubmitReceipt};

pub struct NeynarHub {
    client: Client,
    api_url: String,
    submit_url: String,
    api_key: SecretString,
    query_timeout: Duration,
    submit_timeout: Duration,
}

impl NeynarHub {
    pub fn new(config: &HubConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| HubError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            submit_url: config.submit_url.clone(),
            api_key,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
        })
    }
}

async fn error_for_status(path: &str, response: reqwest::Response) -> HubError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    HubError::Status {
        path: path.to_string(),
        status,
        body,
    }
}

#[async_trait]
impl QueryService for NeynarHub {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.api_url, path);
        debug!(url = %url, "Querying Neynar");

        let response = self
            .client
            .get(&url)
            .query(params)
            .header("accept", "application/json")
            .header("api_key", self.api_key.expose_secret())
            .timeout(self.query_timeout)
            .send()
            .await
            .map_err(HubError::from)?;

        if !response.status().is_success() {
            return Err(error_for_status(&format!("Neynar {}", path), response).await.into());
        }

        let value = response.json::<Value>().await.map_err(HubError::from)?;
        Ok(value)
    }
}

#[async_trait]
impl Submitter for NeynarHub {
    async fn submit(&self, message: &SignedMessage) -> Result<SubmitReceipt> {
        debug!(hash = %message.hash, bytes = message.bytes.len(), "Submitting message");

        let response = self
            .client
            .post(&self.submit_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header("x-api-key", self.api_key.expose_secret())
            .body(message.bytes.clone())
            .timeout(self.submit_timeout)
            .send()
            .await
            .map_err(HubError::from)?;

        if !response.status().is_success() {
            return Err(error_for_status("Hub submit", response).await.into());
        }

        let data = response.json::<Value>().await.map_err(HubError::from)?;
        let hash = data
            .get("hash")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| message.hash.clone());

        Ok(SubmitReceipt { hash, data })
    }
}
