//! Export request models.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::test_report::{RunFilter, build_filter, non_blank};
use crate::error::{AppError, AppResult};

/// Output format of `GET /export-report/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ExportFormat {
    Json,
    Pdf,
    Email,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

/// Query string of `GET /export-report/`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// json (default), pdf or email
    pub format: Option<String>,
    /// Include steps
    #[serde(default)]
    pub detailed: bool,
    pub suite_id: Option<i32>,
    /// Export a single run
    pub test_id: Option<i32>,
    pub test_name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Required for email
    pub recipient: Option<String>,
}

impl ExportQuery {
    pub fn format(&self) -> AppResult<ExportFormat> {
        match self.format.as_deref() {
            None => Ok(ExportFormat::Json),
            Some(raw) => ExportFormat::parse(raw).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Unsupported export format '{}', expected json, pdf or email",
                    raw
                ))
            }),
        }
    }

    pub fn to_filter(&self) -> AppResult<RunFilter> {
        build_filter(
            non_blank(self.test_name.as_ref()),
            non_blank(self.status.as_ref()),
            non_blank(self.start_date.as_ref()),
            non_blank(self.end_date.as_ref()),
            RunFilter {
                run_id: self.test_id,
                suite_id: self.suite_id,
                ..Default::default()
            },
        )
    }

    /// Recipient address for e-mail export.
    pub fn recipient(&self) -> AppResult<&str> {
        self.recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| r.contains('@'))
            .ok_or_else(|| {
                AppError::InvalidInput("recipient is required for email export".to_string())
            })
    }
}
