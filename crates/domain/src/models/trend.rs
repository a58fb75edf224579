//! Trend prediction models.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::period::{Period, PeriodLabel};

/// Default number of future periods to predict.
pub const DEFAULT_PREDICTION_PERIODS: u32 = 3;

/// Complaint counts for one period bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub period: PeriodLabel,
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
}

impl PeriodBucket {
    pub fn empty(period: PeriodLabel) -> Self {
        Self {
            period,
            total: 0,
            resolved: 0,
            pending: 0,
        }
    }
}

/// A predicted bucket. Always flagged as a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPoint {
    pub period: PeriodLabel,
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
    pub is_prediction: bool,
}

/// Query parameters for the trend prediction endpoint.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PredictionQuery {
    /// week, month, quarter or year. Unknown values mean month.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    /// Number of future periods, 1 to 24.
    #[serde(default)]
    #[validate(range(min = 1, max = 24, message = "months must be between 1 and 24"))]
    pub months: Option<u32>,
}

impl PredictionQuery {
    pub fn period(&self) -> Period {
        Period::parse_or_default(self.period.as_deref())
    }

    pub fn prediction_periods(&self) -> u32 {
        self.months.unwrap_or(DEFAULT_PREDICTION_PERIODS)
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref().filter(|d| !d.is_empty())
    }
}

/// Echo of the effective request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMetadata {
    pub period: Period,
    pub category: Option<String>,
    pub department: Option<String>,
    pub prediction_months: u32,
}

/// Trend prediction response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub historical: Vec<PeriodBucket>,
    pub predictions: Vec<PredictionPoint>,
    pub metadata: PredictionMetadata,
}
