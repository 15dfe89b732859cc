//! Aggregation and error-metric response models.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Optional project/suite scope shared by the metric endpoints.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MetricsQuery {
    pub project_id: Option<i32>,
    pub suite_id: Option<i32>,
}

/// Totals over a set of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregatedReport {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    /// Percentage in `[0, 100]`
    pub pass_rate: f64,
    /// Seconds
    pub avg_execution_time: f64,
}

/// Totals for the runs of one suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SuiteAggregate {
    pub suite_id: i32,
    pub suite_name: String,
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub pass_rate: f64,
    pub avg_execution_time: f64,
}

/// Runs per UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: u64,
}

/// Runs per ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyCount {
    /// Monday of the week, `YYYY-MM-DD`
    pub week: String,
    pub count: u64,
}

/// Parallel label/value arrays for charting error buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorTypeMetrics {
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}
