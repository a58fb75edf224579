//! Persistence layer for the SULABH reporting service.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain provider traits
//! - Query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use db::{connect, run_migrations, DatabaseConfig};
pub use repositories::{PgAttemptLimiter, PgCacheStore, PgComplaintSource};
