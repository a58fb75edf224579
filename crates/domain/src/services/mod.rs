//! Domain services for the SULABH reporting service.
//!
//! Pure aggregation and prediction logic, plus the provider traits the
//! report service is built on.

pub mod aggregation;
pub mod cache;
pub mod export;
pub mod login_attempts;
pub mod prediction;
pub mod reports;
pub mod source;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{with_cache, CacheError, CacheStore, InMemoryCacheStore};
pub use export::{ExportFormat, ExportedReport, ReportKind};
pub use login_attempts::{
    AttemptDecision, AttemptLimiter, AttemptWindow, InMemoryAttemptLimiter, LOCKOUT_MINUTES,
    MAX_ATTEMPTS,
};
pub use reports::{ReportService, REPORT_ENDPOINTS};
pub use source::{ComplaintSource, InMemoryComplaintSource};
