//! Domain layer for the SULABH reporting service.
//!
//! This crate contains:
//! - Domain models (complaints, reports, trends, cache entries)
//! - Pure aggregation and prediction logic
//! - Service traits with in-memory providers
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::ReportError;
