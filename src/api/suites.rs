//! Test suite management.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{ListSuitesQuery, MessageResponse, SuiteRequest, SuiteResponse};

#[utoipa::path(
    post,
    path = "/create-test-suite/",
    tag = "Suites",
    request_body = SuiteRequest,
    responses(
        (status = 200, description = "Suite created", body = SuiteResponse),
        (status = 400, description = "Blank or duplicate name", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_test_suite(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<SuiteRequest>,
) -> AppResult<HttpResponse> {
    let name = body.normalized_name()?;
    if let Some(project_id) = body.project_id {
        auth.user.ensure_project_access(project_id)?;
    }

    let suite = pool.create_suite(&name, body.project_id).await?;
    info!(suite_id = suite.id, suite_name = %suite.suite_name, "Test suite created");
    Ok(HttpResponse::Ok().json(SuiteResponse::from(suite)))
}

/// Suites ordered by ID. Non-admins see unbound suites and those of their projects.
#[utoipa::path(
    get,
    path = "/test-suites/",
    tag = "Suites",
    params(ListSuitesQuery),
    responses((status = 200, description = "Suites", body = Vec<SuiteResponse>)),
    security(("bearer" = []))
)]
pub async fn list_test_suites(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<ListSuitesQuery>,
) -> AppResult<HttpResponse> {
    if let Some(project_id) = query.project_id {
        auth.user.ensure_project_access(project_id)?;
    }

    let visibility = auth.user.visibility();
    let suites: Vec<SuiteResponse> = pool
        .list_suites(query.project_id)
        .await?
        .into_iter()
        .filter(|s| s.project_id.is_none() || visibility.allows(s.project_id))
        .map(SuiteResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(suites))
}

#[utoipa::path(
    patch,
    path = "/test-suites/{suite_id}",
    tag = "Suites",
    params(("suite_id" = i32, Path, description = "Suite ID")),
    request_body = SuiteRequest,
    responses(
        (status = 200, description = "Suite updated", body = SuiteResponse),
        (status = 400, description = "Blank or duplicate name", body = crate::error::ErrorResponse),
        (status = 404, description = "Suite or project not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_test_suite(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<SuiteRequest>,
) -> AppResult<HttpResponse> {
    let name = body.normalized_name()?;
    let suite = pool
        .update_suite(admin.user.id, path.into_inner(), &name, body.project_id)
        .await?;
    Ok(HttpResponse::Ok().json(SuiteResponse::from(suite)))
}

#[utoipa::path(
    delete,
    path = "/test-suites/{suite_id}",
    tag = "Suites",
    params(("suite_id" = i32, Path, description = "Suite ID")),
    responses(
        (status = 200, description = "Suite deleted", body = MessageResponse),
        (status = 404, description = "Suite not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_test_suite(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let suite = pool.delete_suite(admin.user.id, path.into_inner()).await?;
    info!(suite_id = suite.id, deleted_by = %admin.user.username, "Test suite deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Test suite deleted")))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/create-test-suite/").route(web::post().to(create_test_suite)))
        .service(web::resource("/test-suites/").route(web::get().to(list_test_suites)))
        .service(
            web::resource("/test-suites/{suite_id}")
                .route(web::patch().to(update_test_suite))
                .route(web::delete().to(delete_test_suite)),
        );
}
