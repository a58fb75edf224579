//! Database entity definitions.
//!
//! Entities map directly to database rows.

pub mod cache_entry;
pub mod complaint;
pub mod login_attempt;
pub mod profile;

pub use cache_entry::CacheEntryEntity;
pub use complaint::{ComplaintEntity, FeedbackEntity, FeedbackWithComplaintEntity};
pub use login_attempt::LoginAttemptEntity;
pub use profile::ProfileEntity;
