//! Test run and step models: ingestion payloads, filters and responses.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::{test_report, test_step};
use crate::error::{AppError, AppResult};

/// Overall outcome of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum RunStatus {
    Pass,
    Fail,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    /// Parse case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl TryFrom<String> for RunStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid run status '{}', expected PASS or FAIL", value))
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum StepStatus {
    Pass,
    Fail,
    Error,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// FAIL and ERROR steps feed error clustering.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Pass)
    }
}

impl TryFrom<String> for StepStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, <Self as TryFrom<String>>::Error> {
        Self::parse(&value)
            .ok_or_else(|| format!("invalid step status '{}', expected PASS, FAIL or ERROR", value))
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// One step as submitted by the reporter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepPayload {
    pub step_number: i32,
    pub step_description: String,
    pub step_status: StepStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /submit-test-result/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitTestResultRequest {
    pub test_name: String,
    pub status: RunStatus,
    /// Duration in seconds
    pub execution_time: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub steps: Vec<StepPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_suite_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_suite_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_project_id: Option<i32>,
}

impl SubmitTestResultRequest {
    /// Check field-level rules before anything touches the database.
    pub fn validate(&self) -> AppResult<()> {
        if self.test_name.trim().is_empty() {
            return Err(AppError::InvalidInput("test_name must not be blank".to_string()));
        }

        if !self.execution_time.is_finite() || self.execution_time < 0.0 {
            return Err(AppError::InvalidInput(
                "execution_time must be a non-negative number of seconds".to_string(),
            ));
        }

        for (idx, step) in self.steps.iter().enumerate() {
            let expected = idx as i32 + 1;
            if step.step_number != expected {
                return Err(AppError::InvalidInput(format!(
                    "steps must be numbered 1..n in order: expected step {}, got {}",
                    expected, step.step_number
                )));
            }
        }

        Ok(())
    }

    /// Suite name as stored: trimmed and lowercased. Blank names count as absent.
    pub fn normalized_suite_name(&self) -> Option<String> {
        self.test_suite_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Response of a successful ingestion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitTestResultResponse {
    pub message: String,
    pub test_id: i32,
}

/// A stored step.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestStepResponse {
    pub id: i32,
    pub step_number: i32,
    pub step_description: String,
    pub step_status: String,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<test_step::Model> for TestStepResponse {
    fn from(m: test_step::Model) -> Self {
        Self {
            id: m.id,
            step_number: m.step_number,
            step_description: m.step_description,
            step_status: m.step_status,
            error_message: m.error_message,
            timestamp: m.timestamp,
        }
    }
}

/// A stored run with its steps and suite name.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TestReportResponse {
    pub id: i32,
    pub test_name: String,
    pub status: String,
    pub execution_time: f64,
    pub timestamp: DateTime<Utc>,
    pub steps: Vec<TestStepResponse>,
    pub test_suite_id: Option<i32>,
    pub test_suite_name: Option<String>,
    pub test_project_id: Option<i32>,
}

impl TestReportResponse {
    pub fn from_parts(
        run: test_report::Model,
        steps: Vec<test_step::Model>,
        suite_name: Option<String>,
    ) -> Self {
        Self {
            id: run.id,
            test_name: run.test_name,
            status: run.status,
            execution_time: run.execution_time,
            timestamp: run.timestamp,
            steps: steps.into_iter().map(TestStepResponse::from).collect(),
            test_suite_id: run.test_suite_id,
            test_suite_name: suite_name,
            test_project_id: run.test_project_id,
        }
    }
}

/// Ordering applied to run listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Id,
    TestName,
    ExecutionTime,
    MostRecent,
}

impl SortKey {
    /// Unknown keys fall back to `Id`.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("test_name") | Some("name") => Self::TestName,
            Some("execution_time") => Self::ExecutionTime,
            Some("most_recent") => Self::MostRecent,
            _ => Self::Id,
        }
    }
}

/// Upper bound on run timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndBound {
    /// `timestamp <= t`
    Inclusive(DateTime<Utc>),
    /// `timestamp < t`
    Exclusive(DateTime<Utc>),
}

/// Parsed filter over stored runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub run_id: Option<i32>,
    pub suite_id: Option<i32>,
    pub project_id: Option<i32>,
    /// Case-insensitive substring
    pub test_name: Option<String>,
    /// Upper-cased exact match
    pub status: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<EndBound>,
    pub min_execution_time: Option<f64>,
    pub max_execution_time: Option<f64>,
    pub sort: SortKey,
}

fn parse_date_only(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Lower bound: a bare date means its midnight.
pub fn parse_start_bound(s: &str) -> AppResult<DateTime<Utc>> {
    if let Some(date) = parse_date_only(s) {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    parse_timestamp(s).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "start_date '{}' must be YYYY-MM-DD or an ISO 8601 timestamp",
            s
        ))
    })
}

/// Upper bound: a bare date covers the whole day, a timestamp is inclusive.
pub fn parse_end_bound(s: &str) -> AppResult<EndBound> {
    if let Some(date) = parse_date_only(s) {
        let next_midnight = date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
        return Ok(EndBound::Exclusive(next_midnight));
    }
    parse_timestamp(s).map(EndBound::Inclusive).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "end_date '{}' must be YYYY-MM-DD or an ISO 8601 timestamp",
            s
        ))
    })
}

pub(crate) fn non_blank(s: Option<&String>) -> Option<&str> {
    s.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Query string of `GET /test-results/`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTestResultsQuery {
    /// Case-insensitive substring of the test name
    pub test_name: Option<String>,
    /// PASS or FAIL
    pub status: Option<String>,
    /// YYYY-MM-DD or ISO 8601 timestamp
    pub start_date: Option<String>,
    /// YYYY-MM-DD (whole day) or ISO 8601 timestamp (inclusive)
    pub end_date: Option<String>,
    pub suite_id: Option<i32>,
    pub project_id: Option<i32>,
    pub min_execution_time: Option<f64>,
    pub max_execution_time: Option<f64>,
    /// id (default), test_name, execution_time, most_recent
    pub sort_by: Option<String>,
}

impl ListTestResultsQuery {
    pub fn to_filter(&self) -> AppResult<RunFilter> {
        build_filter(
            non_blank(self.test_name.as_ref()),
            non_blank(self.status.as_ref()),
            non_blank(self.start_date.as_ref()),
            non_blank(self.end_date.as_ref()),
            RunFilter {
                suite_id: self.suite_id,
                project_id: self.project_id,
                min_execution_time: self.min_execution_time,
                max_execution_time: self.max_execution_time,
                sort: SortKey::parse(self.sort_by.as_deref()),
                ..Default::default()
            },
        )
    }
}

/// Fill the string-typed parts of a filter and check cross-field rules.
pub(crate) fn build_filter(
    test_name: Option<&str>,
    status: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    mut filter: RunFilter,
) -> AppResult<RunFilter> {
    filter.test_name = test_name.map(str::to_string);
    filter.status = status.map(str::to_uppercase);
    filter.start = start_date.map(parse_start_bound).transpose()?;
    filter.end = end_date.map(parse_end_bound).transpose()?;

    if let (Some(min), Some(max)) = (filter.min_execution_time, filter.max_execution_time)
        && min > max
    {
        return Err(AppError::InvalidInput(
            "min_execution_time must not exceed max_execution_time".to_string(),
        ));
    }

    Ok(filter)
}
