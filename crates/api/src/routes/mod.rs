//! HTTP route handlers.

pub mod auth;
pub mod cache;
pub mod complaints;
pub mod health;
pub mod predictions;
pub mod reports;
