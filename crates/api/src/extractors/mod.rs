//! Custom Axum extractors.

pub mod request;
pub mod viewer;

pub use request::{JsonBody, PathParams, QueryParams};
pub use viewer::CurrentViewer;
