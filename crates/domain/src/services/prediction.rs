//! Complaint volume forecasting.
//!
//! Historical complaints are bucketed by period and two independent least
//! squares lines (total and resolved) are extrapolated over bucket indices.

use std::collections::BTreeMap;

use crate::models::period::{Period, PeriodLabel};
use crate::models::trend::{PredictionMetadata, PredictionResponse};
use crate::models::{
    ComplaintRecord, ComplaintStatus, PeriodBucket, PredictionPoint, PredictionQuery,
};

pub use crate::models::period::next_period;

/// Fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    pub slope: f64,
    pub intercept: f64,
}

impl RegressionLine {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least squares fit.
///
/// A degenerate input (all `x` equal, or fewer than two points) yields a flat
/// line through the mean of `y`.
pub fn linear_regression(x: &[f64], y: &[f64]) -> RegressionLine {
    let n = x.len().min(y.len());
    if n == 0 {
        return RegressionLine {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y.iter()) {
        sum_x += xi;
        sum_y += yi;
        sum_xy += xi * yi;
        sum_xx += xi * xi;
    }

    let n = n as f64;
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return RegressionLine {
            slope: 0.0,
            intercept: sum_y / n,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    RegressionLine {
        slope,
        intercept: (sum_y - slope * sum_x) / n,
    }
}

/// Buckets complaints by submission period, oldest bucket first.
///
/// `resolved` counts status resolved and `pending` counts status pending;
/// other statuses only add to `total`.
pub fn group_by_period<'a>(
    rows: impl IntoIterator<Item = &'a ComplaintRecord>,
    period: Period,
) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<PeriodLabel, PeriodBucket> = BTreeMap::new();
    for row in rows {
        let label = period.label_for(row.submitted_at);
        let bucket = buckets
            .entry(label)
            .or_insert_with(|| PeriodBucket::empty(label));
        bucket.total += 1;
        match row.status {
            ComplaintStatus::Resolved => bucket.resolved += 1,
            ComplaintStatus::Pending => bucket.pending += 1,
            _ => {}
        }
    }
    buckets.into_values().collect()
}

fn predicted_count(line: &RegressionLine, index: usize) -> i64 {
    (line.at(index as f64).round() as i64).max(0)
}

/// Extrapolates `periods` buckets past the end of `historical`.
///
/// Needs at least two historical buckets; otherwise nothing is predicted.
pub fn predict_future(historical: &[PeriodBucket], periods: u32) -> Vec<PredictionPoint> {
    let Some(last) = historical.last() else {
        return Vec::new();
    };
    if historical.len() < 2 {
        return Vec::new();
    }

    let x: Vec<f64> = (0..historical.len()).map(|i| i as f64).collect();
    let totals: Vec<f64> = historical.iter().map(|b| b.total as f64).collect();
    let resolved: Vec<f64> = historical.iter().map(|b| b.resolved as f64).collect();

    let total_line = linear_regression(&x, &totals);
    let resolved_line = linear_regression(&x, &resolved);

    (1..=periods)
        .map(|i| {
            let index = historical.len() + i as usize - 1;
            let total = predicted_count(&total_line, index);
            let resolved = predicted_count(&resolved_line, index);
            PredictionPoint {
                period: last.period.advance(i),
                total,
                resolved,
                pending: (total - resolved).max(0),
                is_prediction: true,
            }
        })
        .collect()
}

/// Filters, buckets and forecasts complaints for a prediction request.
pub fn trend_forecast(rows: &[ComplaintRecord], query: &PredictionQuery) -> PredictionResponse {
    let period = query.period();
    let category = query.category();
    let department = query.department();
    let periods = query.prediction_periods();

    let filtered = rows.iter().filter(|r| {
        category.map_or(true, |c| r.category == c)
            && department.map_or(true, |d| r.assigned_department.as_deref() == Some(d))
    });

    let historical = group_by_period(filtered, period);
    let predictions = predict_future(&historical, periods);

    PredictionResponse {
        historical,
        predictions,
        metadata: PredictionMetadata {
            period,
            category: category.map(str::to_string),
            department: department.map(str::to_string),
            prediction_months: periods,
        },
    }
}
