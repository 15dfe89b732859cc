//! Best-effort submission of a finished run to the reporting server.

use std::env;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::step_log::StepLog;
use crate::models::{
    RunStatus, StepPayload, SubmitTestResultRequest, SubmitTestResultResponse, TokenResponse,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the reporting server.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    pub timeout: Duration,
}

impl ReporterConfig {
    /// Read `RRS_REPORTER_URL`, `RRS_REPORTER_USERNAME`, `RRS_REPORTER_PASSWORD`
    /// and `RRS_REPORTER_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> Result<Self, ReportingError> {
        let var = |name: &'static str| {
            env::var(name).map_err(|_| ReportingError::Config(format!("{} is not set", name)))
        };

        let timeout_secs = match env::var("RRS_REPORTER_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ReportingError::Config("RRS_REPORTER_TIMEOUT_SECS must be a number".to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url: var("RRS_REPORTER_URL")?,
            username: var("RRS_REPORTER_USERNAME")?,
            password: SecretString::from(var("RRS_REPORTER_PASSWORD")?),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Why a submission did not go through.
#[derive(Debug, thiserror::Error)]
pub enum ReportingError {
    #[error("Reporter configuration error: {0}")]
    Config(String),

    #[error("Request to reporting server failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Login to reporting server failed with status {0}")]
    Authentication(u16),

    #[error("Reporting server rejected the run with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Run-level fields of a finished test execution.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub test_name: String,
    pub status: RunStatus,
    pub execution_time: Duration,
    pub timestamp: DateTime<Utc>,
    pub suite_id: Option<i32>,
    pub suite_name: Option<String>,
    pub project_id: Option<i32>,
}

impl RunOutcome {
    pub fn new(test_name: impl Into<String>, status: RunStatus, execution_time: Duration) -> Self {
        Self {
            test_name: test_name.into(),
            status,
            execution_time,
            timestamp: Utc::now(),
            suite_id: None,
            suite_name: None,
            project_id: None,
        }
    }

    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = Some(name.into());
        self
    }

    pub fn with_suite_id(mut self, id: i32) -> Self {
        self.suite_id = Some(id);
        self
    }

    pub fn with_project(mut self, id: i32) -> Self {
        self.project_id = Some(id);
        self
    }

    fn into_request(self, steps: Vec<StepPayload>) -> SubmitTestResultRequest {
        SubmitTestResultRequest {
            test_name: self.test_name,
            status: self.status,
            execution_time: self.execution_time.as_secs_f64(),
            timestamp: self.timestamp,
            steps,
            test_suite_id: self.suite_id,
            test_suite_name: self.suite_name,
            test_project_id: self.project_id,
        }
    }
}

/// Logs in and posts runs to the reporting server.
#[derive(Debug, Clone)]
pub struct ResultSubmitter {
    client: reqwest::Client,
    config: ReporterConfig,
}

impl ResultSubmitter {
    pub fn new(config: ReporterConfig) -> Result<Self, ReportingError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn login(&self) -> Result<SecretString, ReportingError> {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[
                ("username", self.config.username.as_str()),
                ("password", self.config.password.expose_secret()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportingError::Authentication(response.status().as_u16()));
        }

        let token: TokenResponse = response.json().await?;
        Ok(SecretString::from(token.access_token))
    }

    /// Drain `log` and submit `run` with its steps, returning the stored run id.
    pub async fn try_submit(
        &self,
        run: RunOutcome,
        log: &mut StepLog,
    ) -> Result<i32, ReportingError> {
        let steps = log.take();
        let token = self.login().await?;
        let body = run.into_request(steps);

        let response = self
            .client
            .post(self.url("/submit-test-result/"))
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportingError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let saved: SubmitTestResultResponse = response.json().await?;
        Ok(saved.test_id)
    }

    /// Fire-and-forget variant of [`try_submit`](Self::try_submit).
    ///
    /// Failures are logged and swallowed. The log is empty afterwards in every case.
    pub async fn submit(&self, run: RunOutcome, log: &mut StepLog) -> Option<i32> {
        let test_name = run.test_name.clone();
        match self.try_submit(run, log).await {
            Ok(id) => {
                tracing::info!(test_name = %test_name, test_id = id, "Test result submitted");
                Some(id)
            }
            Err(ReportingError::Authentication(status)) => {
                tracing::error!(test_name = %test_name, status, "Reporter login failed; result not submitted");
                None
            }
            Err(e) => {
                tracing::warn!(test_name = %test_name, error = %e, "Failed to submit test result");
                None
            }
        }
    }
}
