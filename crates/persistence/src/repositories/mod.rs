//! Repository implementations of the domain provider traits.

pub mod cache;
pub mod complaint;
pub mod login_attempt;

pub use cache::PgCacheStore;
pub use complaint::PgComplaintSource;
pub use login_attempt::PgAttemptLimiter;
