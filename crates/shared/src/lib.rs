//! Shared utilities and common types for the SULABH reporting service.
//!
//! This crate provides common functionality used across all other crates:
//! - Deterministic cache key construction
//! - Viewer token verification
//! - Common validation logic

pub mod cache_key;
pub mod jwt;
pub mod validation;
