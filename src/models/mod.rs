//! Request, response and filter models.

pub mod audit_log;
pub mod comment;
pub mod export;
pub mod metrics;
pub mod project;
pub mod suite;
pub mod test_report;
pub mod user;

// Re-export commonly used types
pub use audit_log::{AuditLogResponse, NewAuditEntry};
pub use comment::{CommentResponse, CreateCommentRequest};
pub use export::{ExportFormat, ExportQuery};
pub use metrics::{
    AggregatedReport, DailyCount, ErrorTypeMetrics, MetricsQuery, SuiteAggregate, WeeklyCount,
};
pub use project::{
    AssignUserQuery, CreateProjectRequest, FavoriteProjectRequest, FavoriteProjectResponse,
    MyProjectsQuery, ProjectResponse, ProjectSummary, UnassignProjectQuery,
};
pub use suite::{ListSuitesQuery, SuiteRequest, SuiteResponse};
pub use test_report::{
    EndBound, ListTestResultsQuery, RunFilter, RunStatus, SortKey, StepPayload, StepStatus,
    SubmitTestResultRequest, SubmitTestResultResponse, TestReportResponse, TestStepResponse,
};
pub use user::{LoginForm, RegisterRequest, Role, TokenResponse, UpdateRoleRequest, UserResponse};

/// Plain `{message}` acknowledgement.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
