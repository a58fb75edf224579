//! Row builders shared by service tests.

use chrono::{DateTime, Duration, Utc};
use fake::faker::lorem::en::Sentence;
use fake::Fake;
use uuid::Uuid;

use crate::models::{
    ComplaintPriority, ComplaintRecord, ComplaintStatus, FeedbackEntry, ProfileRecord, UserRole,
};

pub fn complaint_at(status: ComplaintStatus, submitted_at: DateTime<Utc>) -> ComplaintRecord {
    ComplaintRecord {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        subject: Sentence(3..6).fake(),
        category: "sanitation".to_string(),
        priority: ComplaintPriority::Medium,
        status,
        assigned_department: Some("Public Works".to_string()),
        submitted_at,
        updated_at: submitted_at,
        resolved_at: None,
        feedback: vec![],
    }
}

/// A complaint submitted `age` ago.
pub fn complaint(status: ComplaintStatus, age: Duration) -> ComplaintRecord {
    complaint_at(status, Utc::now() - age)
}

/// A resolved complaint submitted `age` ago and resolved `took` later.
pub fn resolved(age: Duration, took: Duration) -> ComplaintRecord {
    let mut record = complaint(ComplaintStatus::Resolved, age);
    record.resolved_at = Some(record.submitted_at + took);
    record
}

pub fn rating(value: i32) -> FeedbackEntry {
    FeedbackEntry {
        id: Uuid::new_v4(),
        rating: value,
        comment: Some(Sentence(2..4).fake()),
        submitted_at: Utc::now(),
    }
}

pub fn profile(role: UserRole, department: Option<&str>, age: Duration) -> ProfileRecord {
    ProfileRecord {
        id: Uuid::new_v4(),
        role,
        department: department.map(str::to_string),
        created_at: Utc::now() - age,
    }
}
