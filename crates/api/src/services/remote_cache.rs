//! HTTP client for a remote cache service.
//!
//! Speaks the `{action, key, data}` contract served by `POST /api/v1/cache`,
//! so one instance can use another's cache.

use async_trait::async_trait;
use domain::models::{CacheAction, CacheLookup, CacheRequest, CacheResponse};
use domain::services::{CacheError, CacheStore};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::CacheConfig;

/// [`CacheStore`] backed by a remote cache service.
#[derive(Debug, Clone)]
pub struct HttpCacheClient {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpCacheClient {
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.remote_timeout_ms))
            .build()
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            url: config.remote_url.clone(),
            token: Some(config.remote_token.clone()).filter(|t| !t.is_empty()),
        })
    }

    async fn call(&self, request: &CacheRequest) -> Result<CacheResponse, CacheError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let status = response.status();

        let body: CacheResponse = response.json().await.map_err(|e| {
            CacheError::Backend(format!("Unreadable cache response ({}): {}", status, e))
        })?;

        if !body.success {
            let reason = body
                .error
                .unwrap_or_else(|| format!("Cache service returned {}", status));
            return Err(CacheError::Rejected(reason));
        }

        Ok(body)
    }

}

#[async_trait]
impl CacheStore for HttpCacheClient {
    async fn get(&self, key: &str) -> Result<CacheLookup, CacheError> {
        let response = self.call(&CacheRequest::new(CacheAction::Get, key)).await?;
        Ok(response.into_lookup())
    }

    async fn set(&self, key: &str, data: Value) -> Result<(), CacheError> {
        self.call(&CacheRequest::new(CacheAction::Set, key).with_data(data))
            .await
            .map(|_| ())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.call(&CacheRequest::new(CacheAction::Invalidate, key))
            .await
            .map(|_| ())
    }

    async fn invalidate_endpoint(&self, endpoint: &str) -> Result<(), CacheError> {
        self.call(&CacheRequest::new(CacheAction::InvalidateEndpoint, endpoint))
            .await
            .map(|_| ())
    }

    /// The cache service expires its own entries.
    async fn purge_expired(&self) -> Result<u64, CacheError> {
        Ok(0)
    }
}
