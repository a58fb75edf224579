//! Report aggregation over in-memory complaint, feedback and profile rows.
//!
//! Every function here is pure. Callers fetch and scope the rows first.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use std::collections::BTreeMap;

use crate::models::report::{
    Breakdown, CategoryFeedback, DepartmentPerformance, FeedbackReport, FeedbackSummary,
    ReportData, TrendPoint, UserActivityReport,
};
use crate::models::{ComplaintRecord, ComplaintStatus, FeedbackRecord, ProfileRecord};

/// Number of trailing windows in a trend series.
pub const TREND_WINDOWS: u32 = 12;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Window width for dashboard trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendGranularity {
    Weekly,
    Monthly,
}

/// Complaint counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub escalated: i64,
    pub closed: i64,
}

pub fn count_statuses(rows: &[ComplaintRecord]) -> StatusCounts {
    rows.iter().fold(StatusCounts::default(), |mut acc, row| {
        acc.total += 1;
        match row.status {
            ComplaintStatus::Pending => acc.pending += 1,
            ComplaintStatus::InProgress => acc.in_progress += 1,
            ComplaintStatus::Resolved => acc.resolved += 1,
            ComplaintStatus::Escalated => acc.escalated += 1,
            ComplaintStatus::Closed => acc.closed += 1,
        }
        acc
    })
}

/// `part / total * 100`, or 0 for an empty total.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mean fractional days from submission to resolution.
///
/// Only rows with status resolved and a `resolved_at` timestamp count toward
/// either the sum or the divisor.
pub fn average_resolution_days<'a>(rows: impl IntoIterator<Item = &'a ComplaintRecord>) -> f64 {
    let (sum, count) = rows
        .into_iter()
        .filter(|r| r.status == ComplaintStatus::Resolved)
        .filter_map(|r| r.resolved_at.map(|at| at - r.submitted_at))
        .fold((0.0, 0usize), |(sum, count), elapsed| {
            (sum + elapsed.num_milliseconds() as f64 / MILLIS_PER_DAY, count + 1)
        });
    mean(sum, count)
}

/// Mean feedback rating across all feedback attached to the rows.
pub fn satisfaction_score<'a>(rows: impl IntoIterator<Item = &'a ComplaintRecord>) -> f64 {
    let (sum, count) = rows
        .into_iter()
        .flat_map(|r| r.feedback.iter())
        .fold((0i64, 0usize), |(sum, count), f| (sum + f.rating as i64, count + 1));
    mean(sum as f64, count)
}

/// Counts rows per key. Rows mapping to `None` are skipped.
pub fn breakdown_by<'a, I, F>(rows: I, key: F) -> Breakdown
where
    I: IntoIterator<Item = &'a ComplaintRecord>,
    F: Fn(&'a ComplaintRecord) -> Option<&'a str>,
{
    let mut counts = Breakdown::new();
    for row in rows {
        if let Some(k) = key(row) {
            *counts.entry(k.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn by_category(rows: &[ComplaintRecord]) -> Breakdown {
    breakdown_by(rows, |r| Some(r.category.as_str()))
}

pub fn by_priority(rows: &[ComplaintRecord]) -> Breakdown {
    breakdown_by(rows, |r| Some(r.priority.as_str()))
}

pub fn by_department(rows: &[ComplaintRecord]) -> Breakdown {
    breakdown_by(rows, |r| r.assigned_department.as_deref())
}

/// Bounds of trailing window `i` (0 is the most recent), half-open.
fn trend_window(
    granularity: TrendGranularity,
    now: DateTime<Utc>,
    i: u32,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match granularity {
        TrendGranularity::Weekly => (
            now - Duration::days(7 * (i as i64 + 1)),
            now - Duration::days(7 * i as i64),
        ),
        TrendGranularity::Monthly => {
            let back = |n: u32| {
                now.checked_sub_months(Months::new(n))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
            };
            (back(i + 1), back(i))
        }
    }
}

fn trend_label(granularity: TrendGranularity, start: DateTime<Utc>) -> String {
    match granularity {
        TrendGranularity::Weekly => format!("Week {}/{}", start.day(), start.month()),
        TrendGranularity::Monthly => start.format("%b %Y").to_string(),
    }
}

/// Submitted, resolved and pending counts for the trailing windows ending at
/// `now`, oldest first.
pub fn time_trends(
    rows: &[ComplaintRecord],
    granularity: TrendGranularity,
    now: DateTime<Utc>,
) -> Vec<TrendPoint> {
    (0..TREND_WINDOWS)
        .rev()
        .map(|i| {
            let (start, end) = trend_window(granularity, now, i);
            let mut point = TrendPoint {
                period: trend_label(granularity, start),
                submitted: 0,
                resolved: 0,
                pending: 0,
            };
            for row in rows
                .iter()
                .filter(|r| r.submitted_at >= start && r.submitted_at < end)
            {
                point.submitted += 1;
                match row.status {
                    ComplaintStatus::Resolved => point.resolved += 1,
                    ComplaintStatus::Pending => point.pending += 1,
                    _ => {}
                }
            }
            point
        })
        .collect()
}

/// Per-department totals, ordered by department name. Unassigned rows are
/// skipped.
pub fn department_performance(rows: &[ComplaintRecord]) -> Vec<DepartmentPerformance> {
    let mut grouped: BTreeMap<&str, Vec<&ComplaintRecord>> = BTreeMap::new();
    for row in rows {
        if let Some(dept) = row.assigned_department.as_deref() {
            grouped.entry(dept).or_default().push(row);
        }
    }

    grouped
        .into_iter()
        .map(|(department, dept_rows)| {
            let counts = dept_rows.iter().fold((0i64, 0i64), |(resolved, pending), r| {
                match r.status {
                    ComplaintStatus::Resolved => (resolved + 1, pending),
                    ComplaintStatus::Pending => (resolved, pending + 1),
                    _ => (resolved, pending),
                }
            });
            DepartmentPerformance {
                department: department.to_string(),
                total_assigned: dept_rows.len() as i64,
                resolved: counts.0,
                pending: counts.1,
                average_resolution_time: average_resolution_days(dept_rows.iter().copied()),
                satisfaction_score: satisfaction_score(dept_rows.iter().copied()),
            }
        })
        .collect()
}

/// Count, mean and distribution of a set of ratings.
pub fn feedback_summary(ratings: impl IntoIterator<Item = i32>) -> FeedbackSummary {
    let mut summary = FeedbackSummary::default();
    let mut sum = 0i64;
    for rating in ratings {
        summary.total_feedbacks += 1;
        sum += rating as i64;
        *summary.rating_distribution.entry(rating).or_insert(0) += 1;
    }
    summary.average_rating = mean(sum as f64, summary.total_feedbacks as usize);
    summary
}

/// Feedback report with per-category totals and averages.
pub fn feedback_report(records: &[FeedbackRecord]) -> FeedbackReport {
    let summary = feedback_summary(records.iter().map(|f| f.rating));

    let mut per_category: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for record in records {
        let entry = per_category.entry(record.category.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += record.rating as i64;
    }

    FeedbackReport {
        total_feedbacks: summary.total_feedbacks,
        average_rating: summary.average_rating,
        rating_distribution: summary.rating_distribution,
        feedback_by_category: per_category
            .into_iter()
            .map(|(category, (total, sum))| {
                (
                    category,
                    CategoryFeedback {
                        total,
                        average_rating: mean(sum as f64, total as usize),
                    },
                )
            })
            .collect(),
    }
}

fn users_by_role(profiles: &[ProfileRecord]) -> Breakdown {
    let mut counts = Breakdown::new();
    for p in profiles {
        *counts.entry(p.role.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// User totals; "new" means created within the month before `now`.
pub fn user_activity(profiles: &[ProfileRecord], now: DateTime<Utc>) -> UserActivityReport {
    let last_month = now
        .checked_sub_months(Months::new(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut by_department = Breakdown::new();
    for dept in profiles
        .iter()
        .filter_map(|p| p.department.as_deref())
        .filter(|d| !d.is_empty())
    {
        *by_department.entry(dept.to_string()).or_insert(0) += 1;
    }

    UserActivityReport {
        total_users: profiles.len() as i64,
        new_users_this_month: profiles.iter().filter(|p| p.created_at >= last_month).count()
            as i64,
        users_by_role: users_by_role(profiles),
        users_by_department: by_department,
    }
}

/// Dashboard figures for complaints and profiles already limited to the
/// report window.
pub fn dashboard(
    rows: &[ComplaintRecord],
    new_profiles: &[ProfileRecord],
    include_department_performance: bool,
    now: DateTime<Utc>,
) -> ReportData {
    let counts = count_statuses(rows);
    let satisfaction = satisfaction_score(rows);

    ReportData {
        total_complaints: counts.total,
        pending_complaints: counts.pending,
        in_progress_complaints: counts.in_progress,
        resolved_complaints: counts.resolved,
        escalated_complaints: counts.escalated,
        closed_complaints: counts.closed,
        average_resolution_time: average_resolution_days(rows),
        resolution_rate: percentage(counts.resolved, counts.total),
        escalation_rate: percentage(counts.escalated, counts.total),
        satisfaction_score: satisfaction,
        complaints_by_category: by_category(rows),
        complaints_by_priority: by_priority(rows),
        complaints_by_department: by_department(rows),
        monthly_trends: time_trends(rows, TrendGranularity::Monthly, now),
        weekly_trends: time_trends(rows, TrendGranularity::Weekly, now),
        active_users: new_profiles.len() as i64,
        new_registrations: new_profiles.len() as i64,
        users_by_role: users_by_role(new_profiles),
        feedback_summary: feedback_summary(
            rows.iter().flat_map(|r| r.feedback.iter().map(|f| f.rating)),
        ),
        department_performance: if include_department_performance {
            department_performance(rows)
        } else {
            Vec::new()
        },
    }
}
