//! Common validation utilities.

use chrono::{DateTime, NaiveDate, Utc};
use validator::ValidationError;

/// Lowest feedback rating a citizen can give.
pub const MIN_RATING: i32 = 1;

/// Highest feedback rating a citizen can give.
pub const MAX_RATING: i32 = 5;

/// Validates that a feedback rating is within 1..=5.
pub fn validate_rating(rating: i32) -> Result<(), ValidationError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        let mut err = ValidationError::new("rating_range");
        err.message = Some("Rating must be between 1 and 5".into());
        Err(err)
    }
}

/// Validates a free-text filter value such as a department or category name.
pub fn validate_filter_value(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("filter_empty");
        err.message = Some("Filter value cannot be blank".into());
        return Err(err);
    }
    if trimmed.len() > 100 {
        let mut err = ValidationError::new("filter_too_long");
        err.message = Some("Filter value cannot exceed 100 characters".into());
        return Err(err);
    }
    if trimmed.contains(':') {
        // ':' separates cache key segments.
        let mut err = ValidationError::new("filter_invalid_char");
        err.message = Some("Filter value cannot contain ':'".into());
        return Err(err);
    }
    Ok(())
}

/// Parses a report date filter, accepting RFC 3339 timestamps or plain dates.
///
/// Plain dates are interpreted as midnight UTC.
pub fn parse_date_filter(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Validates that a date filter is parseable.
pub fn validate_date_filter(value: &str) -> Result<(), ValidationError> {
    if parse_date_filter(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("date_format");
        err.message = Some("Dates must be YYYY-MM-DD or RFC 3339".into());
        Err(err)
    }
}
