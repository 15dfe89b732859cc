//! User administration and the audit trail.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::AdminUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditLogResponse, MessageResponse, Role, UnassignProjectQuery, UpdateRoleRequest, UserResponse,
};

#[utoipa::path(
    get,
    path = "/users/",
    tag = "Admin",
    responses((status = 200, description = "Users with their projects", body = Vec<UserResponse>)),
    security(("bearer" = []))
)]
pub async fn list_users(_admin: AdminUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let users = pool.list_users().await?;
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let mut projects = pool.projects_by_user(&ids).await?;

    let body: Vec<UserResponse> = users
        .into_iter()
        .map(|u| {
            let assigned = projects.remove(&u.id).unwrap_or_default();
            UserResponse::new(u, assigned)
        })
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}/role",
    tag = "Admin",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_user_role(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    body: web::Json<UpdateRoleRequest>,
) -> AppResult<HttpResponse> {
    let role = Role::parse(&body.role).ok_or_else(|| {
        AppError::InvalidInput(format!("Unknown role '{}', expected admin or user", body.role))
    })?;

    let user = pool
        .update_user_role(admin.user.id, path.into_inner(), role)
        .await?;
    let mut projects = pool.projects_by_user(&[user.id]).await?;
    let assigned = projects.remove(&user.id).unwrap_or_default();

    info!(user_id = user.id, role = %role, changed_by = %admin.user.username, "User role updated");
    Ok(HttpResponse::Ok().json(UserResponse::new(user, assigned)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "Admin",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted user", body = UserResponse),
        (status = 400, description = "Cannot delete own account", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_user(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let user = pool.delete_user(admin.user.id, path.into_inner()).await?;
    info!(user_id = user.id, deleted_by = %admin.user.username, "User deleted");
    Ok(HttpResponse::Ok().json(UserResponse::new(user, Vec::new())))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/projects",
    tag = "Admin",
    params(("user_id" = i32, Path, description = "User ID"), UnassignProjectQuery),
    responses(
        (status = 200, description = "User unassigned", body = MessageResponse),
        (status = 400, description = "User not assigned to the project", body = crate::error::ErrorResponse),
        (status = 404, description = "User or project not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn unassign_user(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<UnassignProjectQuery>,
) -> AppResult<HttpResponse> {
    let (project, user) = pool
        .unassign_user_from_project(admin.user.id, path.into_inner(), query.project_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "User {} unassigned from project {}",
        user.username, project.project_name
    ))))
}

#[utoipa::path(
    get,
    path = "/audit-logs/",
    tag = "Admin",
    responses((status = 200, description = "Audit entries, newest first", body = Vec<AuditLogResponse>)),
    security(("bearer" = []))
)]
pub async fn list_audit_logs(
    _admin: AdminUser,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let logs: Vec<AuditLogResponse> = pool
        .list_audit_logs()
        .await?
        .into_iter()
        .map(AuditLogResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(logs))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users/").route(web::get().to(list_users)))
        .service(web::resource("/users/{user_id}/role").route(web::patch().to(update_user_role)))
        .service(web::resource("/users/{user_id}/projects").route(web::delete().to(unassign_user)))
        .service(web::resource("/users/{user_id}").route(web::delete().to(delete_user)))
        .service(web::resource("/audit-logs/").route(web::get().to(list_audit_logs)));
}
