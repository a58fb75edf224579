//! External service integrations.

pub mod remote_cache;

pub use remote_cache::HttpCacheClient;
