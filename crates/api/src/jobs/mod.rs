//! Background job scheduler and job implementations.

mod expired_entries;
mod pool_metrics;
mod scheduler;

pub use expired_entries::ExpiredEntriesJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
