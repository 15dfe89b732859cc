//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Run Report Server",
        version = "0.1.0",
        description = "Stores automated test runs with their steps and serves filtering, metrics and exports"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health
        api::health::health,
        api::health::ready,
        // Authentication
        api::auth::login,
        api::auth::register,
        api::auth::me,
        // Test reports
        api::test_reports::submit_test_result,
        api::test_reports::list_test_results,
        api::test_reports::get_test_result,
        api::test_reports::delete_test_result,
        api::test_reports::add_comment,
        api::test_reports::list_comments,
        // Metrics
        api::metrics::aggregated_reports,
        api::metrics::aggregated_by_suite,
        api::metrics::tests_per_day,
        api::metrics::tests_per_week,
        api::metrics::error_types_metrics,
        // Projects
        api::projects::create_project,
        api::projects::list_projects,
        api::projects::my_projects,
        api::projects::assign_user,
        api::projects::delete_project,
        api::projects::add_favorite,
        api::projects::list_favorites,
        api::projects::remove_favorite,
        // Suites
        api::suites::create_test_suite,
        api::suites::list_test_suites,
        api::suites::update_test_suite,
        api::suites::delete_test_suite,
        // Admin
        api::admin::list_users,
        api::admin::update_user_role,
        api::admin::delete_user,
        api::admin::unassign_user,
        api::admin::list_audit_logs,
        // Export
        api::export::export_report,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            models::MessageResponse,
            models::LoginForm,
            models::TokenResponse,
            models::RegisterRequest,
            models::UpdateRoleRequest,
            models::UserResponse,
            models::Role,
            models::RunStatus,
            models::StepStatus,
            models::StepPayload,
            models::SubmitTestResultRequest,
            models::SubmitTestResultResponse,
            models::TestStepResponse,
            models::TestReportResponse,
            models::CreateCommentRequest,
            models::CommentResponse,
            models::CreateProjectRequest,
            models::ProjectResponse,
            models::ProjectSummary,
            models::FavoriteProjectRequest,
            models::FavoriteProjectResponse,
            models::SuiteRequest,
            models::SuiteResponse,
            models::AggregatedReport,
            models::SuiteAggregate,
            models::DailyCount,
            models::WeeklyCount,
            models::ErrorTypeMetrics,
            models::AuditLogResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Login, registration and current user"),
        (name = "Test Reports", description = "Run ingestion, queries and comments"),
        (name = "Metrics", description = "Aggregates and error clustering"),
        (name = "Projects", description = "Projects and user assignment"),
        (name = "Favourite Projects", description = "Per-user favourite projects"),
        (name = "Suites", description = "Test suite management"),
        (name = "Admin", description = "User administration and audit log"),
        (name = "Export", description = "JSON, PDF and e-mail export")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add bearer token security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve the generated document.
#[get("/api-docs/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
