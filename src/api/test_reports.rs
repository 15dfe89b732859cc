//! Test run ingestion, listing, deletion and comments.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::{AdminUser, AuthUser, CurrentUser};
use crate::db::DbPool;
use crate::entity::test_report;
use crate::error::{AppError, AppResult};
use crate::models::{
    CommentResponse, CreateCommentRequest, ListTestResultsQuery, MessageResponse,
    SubmitTestResultRequest, SubmitTestResultResponse, TestReportResponse,
};

/// Load a run the caller is allowed to see: 404 if missing, 403 if out of scope.
async fn visible_run(
    pool: &DbPool,
    user: &CurrentUser,
    id: i32,
) -> AppResult<test_report::Model> {
    let run = pool
        .get_test_report(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test report {}", id)))?;

    if !user.visibility().allows(run.test_project_id) {
        return Err(AppError::Forbidden(format!(
            "Not authorized to view test report {}",
            id
        )));
    }
    Ok(run)
}

/// Store one run with its steps.
#[utoipa::path(
    post,
    path = "/submit-test-result/",
    tag = "Test Reports",
    request_body = SubmitTestResultRequest,
    responses(
        (status = 200, description = "Test result saved", body = SubmitTestResultResponse),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
        (status = 403, description = "Project not assigned to caller", body = crate::error::ErrorResponse),
        (status = 404, description = "Project or suite not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_test_result(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<SubmitTestResultRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    if let Some(project_id) = req.test_project_id {
        pool.get_project(project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test project {}", project_id)))?;
        auth.user.ensure_project_access(project_id)?;
    }

    let test_id = pool.insert_test_result(&req).await?;

    info!(
        test_id,
        submitted_by = %auth.user.username,
        "Test result submitted"
    );

    Ok(HttpResponse::Ok().json(SubmitTestResultResponse {
        message: "Test result saved successfully".to_string(),
        test_id,
    }))
}

/// Runs visible to the caller, filtered and sorted.
#[utoipa::path(
    get,
    path = "/test-results/",
    tag = "Test Reports",
    params(ListTestResultsQuery),
    responses(
        (status = 200, description = "Matching runs with steps", body = Vec<TestReportResponse>),
        (status = 400, description = "Malformed filter", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_test_results(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<ListTestResultsQuery>,
) -> AppResult<HttpResponse> {
    let filter = query.into_inner().to_filter()?;
    let runs = pool
        .list_test_reports(&filter, &auth.user.visibility())
        .await?;
    Ok(HttpResponse::Ok().json(runs))
}

/// One run with its steps.
#[utoipa::path(
    get,
    path = "/test-results/{test_id}",
    tag = "Test Reports",
    params(("test_id" = i32, Path, description = "Run ID")),
    responses(
        (status = 200, description = "The run", body = TestReportResponse),
        (status = 403, description = "Outside the caller's projects", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_test_result(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let run = visible_run(&pool, &auth.user, id).await?;
    let report = pool
        .hydrate_runs(vec![run])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Test report {}", id)))?;
    Ok(HttpResponse::Ok().json(report))
}

/// Delete a run with its steps and comments.
#[utoipa::path(
    delete,
    path = "/test-results/{test_id}",
    tag = "Test Reports",
    params(("test_id" = i32, Path, description = "Run ID")),
    responses(
        (status = 200, description = "Run deleted", body = MessageResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_test_result(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    pool.delete_test_report(admin.user.id, id).await?;
    info!(test_id = id, deleted_by = %admin.user.username, "Test report deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Test report deleted")))
}

/// Comment on a run.
#[utoipa::path(
    post,
    path = "/test-results/{test_id}/comments",
    tag = "Test Reports",
    params(("test_id" = i32, Path, description = "Run ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment stored", body = CommentResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn add_comment(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let text = body.comment_text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput(
            "comment_text must not be blank".to_string(),
        ));
    }

    visible_run(&pool, &auth.user, id).await?;
    let comment = pool.add_comment(id, auth.user.id, text).await?;
    Ok(HttpResponse::Ok().json(CommentResponse::new(comment, Some(auth.user.username))))
}

/// Comments on a run, newest first.
#[utoipa::path(
    get,
    path = "/test-results/{test_id}/comments",
    tag = "Test Reports",
    params(("test_id" = i32, Path, description = "Run ID")),
    responses(
        (status = 200, description = "Comments", body = Vec<CommentResponse>),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_comments(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    visible_run(&pool, &auth.user, id).await?;

    let comments: Vec<CommentResponse> = pool
        .list_comments(id)
        .await?
        .into_iter()
        .map(|(comment, author)| CommentResponse::new(comment, author))
        .collect();
    Ok(HttpResponse::Ok().json(comments))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/submit-test-result/").route(web::post().to(submit_test_result)))
        .service(web::resource("/test-results/").route(web::get().to(list_test_results)))
        .service(
            web::resource("/test-results/{test_id}")
                .route(web::get().to(get_test_result))
                .route(web::delete().to(delete_test_result)),
        )
        .service(
            web::resource("/test-results/{test_id}/comments")
                .route(web::get().to(list_comments))
                .route(web::post().to(add_comment)),
        );
}
