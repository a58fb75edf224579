//! Deterministic cache key construction.
//!
//! Keys have the layout `endpoint[:user=<id>][:dept=<department>][:<params>]`
//! where `<params>` is the `k=v` pairs sorted by key and joined with `&`.
//! Two logically identical queries always map to the same key, whatever order
//! their parameters were supplied in.

use std::collections::BTreeMap;

/// Flat, ordered set of cache-key parameters.
///
/// Absent and empty values are dropped on insertion. Inserting the same name
/// twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheParams {
    pairs: BTreeMap<String, String>,
}

impl CacheParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, ignoring `None` and empty strings.
    pub fn with<V: ToString>(mut self, name: &str, value: Option<V>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert<V: ToString>(&mut self, name: &str, value: Option<V>) {
        if let Some(value) = value {
            let value = value.to_string();
            if !value.is_empty() {
                self.pairs.insert(name.to_string(), value);
                return;
            }
        }
        self.pairs.remove(name);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Renders the sorted `k=v&k=v` query fragment.
    pub fn to_query(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for CacheParams
where
    K: AsRef<str>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut params = CacheParams::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// Builds the cache key for an endpoint query.
///
/// User and department context are appended as separate segments so one
/// tenant's cached data is never served to another.
pub fn generate_cache_key(
    endpoint: &str,
    params: &CacheParams,
    user_id: Option<&str>,
    department: Option<&str>,
) -> String {
    let mut key = endpoint.to_string();

    if let Some(user_id) = user_id.filter(|u| !u.is_empty()) {
        key.push_str(":user=");
        key.push_str(user_id);
    }

    if let Some(department) = department.filter(|d| !d.is_empty()) {
        key.push_str(":dept=");
        key.push_str(department);
    }

    if !params.is_empty() {
        key.push(':');
        key.push_str(&params.to_query());
    }

    key
}

/// Returns the endpoint segment of a cache key.
pub fn endpoint_of(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

/// Whether `key` was built for `endpoint`.
pub fn belongs_to_endpoint(key: &str, endpoint: &str) -> bool {
    endpoint_of(key) == endpoint
}
