//! Test suite models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::test_suite;
use crate::error::{AppError, AppResult};

/// Body of `POST /create-test-suite/` and `PATCH /test-suites/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuiteRequest {
    pub suite_name: String,
    #[serde(default)]
    pub project_id: Option<i32>,
}

impl SuiteRequest {
    /// Name as stored: trimmed and lowercased.
    pub fn normalized_name(&self) -> AppResult<String> {
        let name = self.suite_name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput(
                "suite_name must not be blank".to_string(),
            ));
        }
        Ok(name.to_lowercase())
    }
}

/// A suite.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuiteResponse {
    pub id: i32,
    pub suite_name: String,
    pub project_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<test_suite::Model> for SuiteResponse {
    fn from(m: test_suite::Model) -> Self {
        Self {
            id: m.id,
            suite_name: m.suite_name,
            project_id: m.project_id,
            created_at: m.created_at,
        }
    }
}

/// Query of `GET /test-suites/`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSuitesQuery {
    pub project_id: Option<i32>,
}
