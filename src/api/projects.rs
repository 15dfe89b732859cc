//! Projects, user assignment and favourites.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::auth::{AdminUser, AuthUser};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AssignUserQuery, CreateProjectRequest, FavoriteProjectRequest, FavoriteProjectResponse,
    MessageResponse, MyProjectsQuery, ProjectResponse,
};

fn to_responses(projects: Vec<crate::entity::project::Model>) -> Vec<ProjectResponse> {
    projects.into_iter().map(ProjectResponse::from).collect()
}

#[utoipa::path(
    post,
    path = "/projects/",
    tag = "Projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Blank or duplicate name", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn create_project(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    body: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    let name = body.project_name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "project_name must not be blank".to_string(),
        ));
    }

    let project = pool.create_project(admin.user.id, name).await?;
    info!(project_id = project.id, project_name = %project.project_name, "Project created");
    Ok(HttpResponse::Ok().json(ProjectResponse::from(project)))
}

#[utoipa::path(
    get,
    path = "/projects/",
    tag = "Projects",
    responses((status = 200, description = "All projects", body = Vec<ProjectResponse>)),
    security(("bearer" = []))
)]
pub async fn list_projects(_admin: AdminUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let projects = pool.list_projects().await?;
    Ok(HttpResponse::Ok().json(to_responses(projects)))
}

/// Projects the caller can see; admins see all.
#[utoipa::path(
    get,
    path = "/projects/my",
    tag = "Projects",
    params(MyProjectsQuery),
    responses(
        (status = 200, description = "Visible projects", body = Vec<ProjectResponse>),
        (status = 403, description = "No projects assigned", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn my_projects(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    query: web::Query<MyProjectsQuery>,
) -> AppResult<HttpResponse> {
    if !auth.user.is_admin() && auth.user.project_ids.is_empty() {
        return Err(AppError::Forbidden(
            "No projects are assigned to the current user".to_string(),
        ));
    }

    let name_filter = query
        .project_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let projects = pool
        .list_visible_projects(&auth.user.visibility(), name_filter)
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(projects)))
}

#[utoipa::path(
    post,
    path = "/projects/{project_id}/assign-user/",
    tag = "Projects",
    params(("project_id" = i32, Path, description = "Project ID"), AssignUserQuery),
    responses(
        (status = 200, description = "User assigned", body = MessageResponse),
        (status = 404, description = "Project or user not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn assign_user(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
    query: web::Query<AssignUserQuery>,
) -> AppResult<HttpResponse> {
    let project_id = path.into_inner();
    let (project, user, newly_assigned) = pool
        .assign_user_to_project(admin.user.id, project_id, query.user_id)
        .await?;

    if newly_assigned {
        info!(project_id, user_id = user.id, "User assigned to project");
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "User {} assigned to project {}",
        user.username, project.project_name
    ))))
}

#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn delete_project(
    admin: AdminUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let project = pool.delete_project(admin.user.id, path.into_inner()).await?;
    info!(project_id = project.id, deleted_by = %admin.user.username, "Project deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Project deleted")))
}

#[utoipa::path(
    post,
    path = "/favourite-projects/",
    tag = "Favourite Projects",
    request_body = FavoriteProjectRequest,
    responses(
        (status = 200, description = "Project favourited", body = FavoriteProjectResponse),
        (status = 400, description = "Already favourited", body = crate::error::ErrorResponse),
        (status = 403, description = "Project not visible", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn add_favorite(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    body: web::Json<FavoriteProjectRequest>,
) -> AppResult<HttpResponse> {
    let project_id = body.project_id;
    pool.get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;
    auth.user.ensure_project_access(project_id)?;

    let favorite = pool.add_favorite_project(auth.user.id, project_id).await?;
    Ok(HttpResponse::Ok().json(FavoriteProjectResponse::from(favorite)))
}

#[utoipa::path(
    get,
    path = "/favourite-projects/",
    tag = "Favourite Projects",
    responses((status = 200, description = "Caller's favourites", body = Vec<ProjectResponse>)),
    security(("bearer" = []))
)]
pub async fn list_favorites(auth: AuthUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let projects = pool.list_favorite_projects(auth.user.id).await?;
    Ok(HttpResponse::Ok().json(to_responses(projects)))
}

#[utoipa::path(
    delete,
    path = "/favourite-projects/{project_id}",
    tag = "Favourite Projects",
    params(("project_id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Favourite removed", body = MessageResponse),
        (status = 404, description = "Not a favourite", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn remove_favorite(
    auth: AuthUser,
    pool: web::Data<DbPool>,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    pool.remove_favorite_project(auth.user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Project removed from favourites")))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/projects/")
            .route(web::get().to(list_projects))
            .route(web::post().to(create_project)),
    )
    // Registered before /projects/{project_id} so "my" is not taken as an ID
    .service(web::resource("/projects/my").route(web::get().to(my_projects)))
    .service(web::resource("/projects/{project_id}/assign-user/").route(web::post().to(assign_user)))
    .service(web::resource("/projects/{project_id}").route(web::delete().to(delete_project)))
    .service(
        web::resource("/favourite-projects/")
            .route(web::get().to(list_favorites))
            .route(web::post().to(add_favorite)),
    )
    .service(
        web::resource("/favourite-projects/{project_id}").route(web::delete().to(remove_favorite)),
    );
}
