//! Dashboard metrics over the caller's visible runs.

use actix_web::{HttpResponse, web};

use crate::auth::{AuthUser, CurrentUser};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AggregatedReport, DailyCount, ErrorTypeMetrics, MetricsQuery, RunFilter, SuiteAggregate,
    WeeklyCount,
};
use crate::services::{aggregation, error_clustering};

/// Run filter for a metrics query; naming an unassigned project is a 403.
fn scoped_filter(user: &CurrentUser, query: &MetricsQuery) -> AppResult<RunFilter> {
    if let Some(project_id) = query.project_id {
        user.ensure_project_access(project_id)?;
    }
    Ok(RunFilter {
        project_id: query.project_id,
        suite_id: query.suite_id,
        ..Default::default()
    })
}

/// Totals and pass rate.
#[utoipa::path(
    get,
    path = "/aggregated-reports/",
    tag = "Metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Aggregated totals", body = AggregatedReport),
        (status = 403, description = "Project not assigned to caller", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn aggregated_reports(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsQuery>,
) -> AppResult<HttpResponse> {
    let filter = scoped_filter(&auth.user, &query)?;
    let report = pool.aggregate_runs(&filter, &auth.user.visibility()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Totals per suite; `project_id` filters on the suite's project.
#[utoipa::path(
    get,
    path = "/aggregated-by-suite/",
    tag = "Metrics",
    params(("project_id" = Option<i32>, Query, description = "Only suites of this project")),
    responses(
        (status = 200, description = "Per-suite totals", body = Vec<SuiteAggregate>),
        (status = 403, description = "Project not assigned to caller", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn aggregated_by_suite(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsQuery>,
) -> AppResult<HttpResponse> {
    if let Some(project_id) = query.project_id {
        auth.user.ensure_project_access(project_id)?;
    }

    let suites = pool.list_suites(query.project_id).await?;
    let runs = pool
        .list_runs(&RunFilter::default(), &auth.user.visibility())
        .await?;
    Ok(HttpResponse::Ok().json(aggregation::by_suite(&suites, &runs)))
}

/// Run counts per UTC day.
#[utoipa::path(
    get,
    path = "/tests-per-day/",
    tag = "Metrics",
    params(MetricsQuery),
    responses((status = 200, description = "Daily counts, ascending", body = Vec<DailyCount>)),
    security(("bearer" = []))
)]
pub async fn tests_per_day(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsQuery>,
) -> AppResult<HttpResponse> {
    let filter = scoped_filter(&auth.user, &query)?;
    let runs = pool.list_runs(&filter, &auth.user.visibility()).await?;
    Ok(HttpResponse::Ok().json(aggregation::per_day(&runs)))
}

/// Run counts per ISO week, keyed by Monday.
#[utoipa::path(
    get,
    path = "/tests-per-week/",
    tag = "Metrics",
    params(MetricsQuery),
    responses((status = 200, description = "Weekly counts, ascending", body = Vec<WeeklyCount>)),
    security(("bearer" = []))
)]
pub async fn tests_per_week(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsQuery>,
) -> AppResult<HttpResponse> {
    let filter = scoped_filter(&auth.user, &query)?;
    let runs = pool.list_runs(&filter, &auth.user.visibility()).await?;
    Ok(HttpResponse::Ok().json(aggregation::per_week(&runs)))
}

/// Failing step messages clustered into buckets.
#[utoipa::path(
    get,
    path = "/error-types-metrics/",
    tag = "Metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Bucket labels and counts", body = ErrorTypeMetrics),
        (status = 400, description = "project_id missing", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn error_types_metrics(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MetricsQuery>,
) -> AppResult<HttpResponse> {
    if query.project_id.is_none() {
        return Err(AppError::InvalidInput("project_id is required".to_string()));
    }
    let filter = scoped_filter(&auth.user, &query)?;
    let messages = pool
        .failure_messages(&filter, &auth.user.visibility())
        .await?;
    Ok(HttpResponse::Ok().json(error_clustering::cluster(messages)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/aggregated-reports/").route(web::get().to(aggregated_reports)))
        .service(web::resource("/aggregated-by-suite/").route(web::get().to(aggregated_by_suite)))
        .service(web::resource("/tests-per-day/").route(web::get().to(tests_per_day)))
        .service(web::resource("/tests-per-week/").route(web::get().to(tests_per_week)))
        .service(
            web::resource("/error-types-metrics/").route(web::get().to(error_types_metrics)),
        );
}
