//! Cache entries and the cache service request/response contract.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::cache_key::endpoint_of;
use std::str::FromStr;

/// TTL applied to endpoints without an explicit configuration.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Longest TTL of any endpoint. Older entries are stale whatever their key.
pub const MAX_TTL_SECS: u64 = 600;

/// Per-endpoint cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEndpointConfig {
    /// Time to live in seconds.
    pub ttl: u64,
    /// Parameters that distinguish cached variants.
    pub vary: Vec<String>,
}

/// Configuration for a known endpoint.
pub fn endpoint_config(endpoint: &str) -> Option<CacheEndpointConfig> {
    let (ttl, vary): (u64, &[&str]) = match endpoint {
        "dashboard_stats" => (300, &["user_role", "department"]),
        "complaints_list" => (120, &["user_id", "department", "status"]),
        "suggestions_list" => (300, &[]),
        "reports" => (600, &["period", "department", "category"]),
        _ => return None,
    };
    Some(CacheEndpointConfig {
        ttl,
        vary: vary.iter().map(|v| v.to_string()).collect(),
    })
}

/// TTL for an endpoint, falling back to [`DEFAULT_TTL_SECS`].
pub fn ttl_for(endpoint: &str) -> Duration {
    let secs = endpoint_config(endpoint)
        .map(|c| c.ttl)
        .unwrap_or(DEFAULT_TTL_SECS);
    Duration::seconds(secs as i64)
}

/// A stored cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: Value) -> Self {
        Self {
            key: key.into(),
            data,
            created_at: Utc::now(),
        }
    }

    /// An entry is fresh while its age is strictly below the endpoint TTL.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < ttl_for(endpoint_of(&self.key))
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheLookup {
    pub data: Option<Value>,
    pub cached: bool,
}

impl CacheLookup {
    pub fn hit(data: Value) -> Self {
        Self {
            data: Some(data),
            cached: true,
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }

    /// Usable only when flagged cached and carrying a non-null payload.
    pub fn is_hit(&self) -> bool {
        self.cached && matches!(self.data, Some(ref v) if !v.is_null())
    }
}

/// Actions understood by the cache service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    GetConfig,
    Get,
    Set,
    Invalidate,
    InvalidateEndpoint,
}

impl CacheAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheAction::GetConfig => "get_config",
            CacheAction::Get => "get",
            CacheAction::Set => "set",
            CacheAction::Invalidate => "invalidate",
            CacheAction::InvalidateEndpoint => "invalidate_endpoint",
        }
    }
}

impl FromStr for CacheAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "get_config" => Ok(CacheAction::GetConfig),
            "get" => Ok(CacheAction::Get),
            "set" => Ok(CacheAction::Set),
            "invalidate" => Ok(CacheAction::Invalidate),
            "invalidate_endpoint" => Ok(CacheAction::InvalidateEndpoint),
            _ => Err(format!("Unknown cache action: {}", s)),
        }
    }
}

/// Cache service request body. `action` stays a string so unknown actions
/// get the service's own error response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheRequest {
    pub action: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CacheRequest {
    pub fn new(action: CacheAction, key: impl Into<String>) -> Self {
        Self {
            action: action.as_str().to_string(),
            key: Some(key.into()),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Cache service response body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CacheEndpointConfig>,
    /// Present on `get`; `null` when nothing fresh is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CacheResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn config(config: CacheEndpointConfig) -> Self {
        Self {
            success: true,
            config: Some(config),
            ..Default::default()
        }
    }

    pub fn lookup(lookup: CacheLookup) -> Self {
        Self {
            success: true,
            data: Some(lookup.data.unwrap_or(Value::Null)),
            cached: Some(lookup.cached),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Lookup view of a `get` response.
    pub fn into_lookup(self) -> CacheLookup {
        CacheLookup {
            data: self.data.filter(|d| !d.is_null()),
            cached: self.cached.unwrap_or(false),
        }
    }
}
