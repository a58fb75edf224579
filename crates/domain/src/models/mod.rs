//! Domain models for the SULABH reporting service.

pub mod cache;
pub mod complaint;
pub mod period;
pub mod report;
pub mod trend;
pub mod viewer;

pub use cache::{CacheAction, CacheEntry, CacheLookup, CacheRequest, CacheResponse};
pub use complaint::{
    ComplaintPriority, ComplaintQuery, ComplaintRecord, ComplaintStatus, FeedbackEntry,
    FeedbackRecord, ProfileRecord, SubmissionOrder,
};
pub use period::{Period, PeriodLabel};
pub use report::{
    ComplaintReport, ComplaintReportFilters, EscalationReport, FeedbackReport, ReportData,
    UserActivityReport,
};
pub use trend::{PeriodBucket, PredictionPoint, PredictionQuery, PredictionResponse};
pub use viewer::{UserRole, Viewer};
