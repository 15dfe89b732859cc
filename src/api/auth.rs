//! Login, self-registration and the current-user endpoint.

use actix_web::{HttpResponse, web};
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, TokenSigner};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{LoginForm, RegisterRequest, Role, TokenResponse, UserResponse};

/// Exchange form credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Authentication",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password", body = crate::error::ErrorResponse),
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    signer: web::Data<TokenSigner>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let user = pool.find_user_by_username(form.username.trim()).await?;

    let Some(user) = user.filter(|u| verify_password(&form.password, &u.hashed_password)) else {
        warn!(username = %form.username, "Login rejected");
        return Err(AppError::Unauthorized(
            "Incorrect username or password".to_string(),
        ));
    };

    let role = Role::parse(&user.role)
        .ok_or_else(|| AppError::Internal(format!("Unknown role '{}' on user {}", user.role, user.id)))?;
    let access_token = signer.issue(user.id, role)?;

    info!(user_id = user.id, username = %user.username, "User logged in");
    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Create a regular user account.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid or duplicate username", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin accounts cannot self-register", body = crate::error::ErrorResponse),
    )
)]
pub async fn register(
    pool: web::Data<DbPool>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::InvalidInput("username must not be blank".to_string()));
    }
    if body.password.is_empty() {
        return Err(AppError::InvalidInput("password must not be empty".to_string()));
    }

    let role = match body.role.as_deref() {
        None => Role::User,
        Some(raw) => Role::parse(raw)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown role '{}'", raw)))?,
    };
    if role.is_admin() {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    let user = pool
        .create_user(username, hash_password(&body.password), role)
        .await?;

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok(HttpResponse::Ok().json(UserResponse::new(user, Vec::new())))
}

/// The caller's account and assigned projects.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn me(auth: AuthUser, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let user = pool
        .get_user(auth.user.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
    let mut projects = pool.projects_by_user(&[user.id]).await?;
    let projects = projects.remove(&user.id).unwrap_or_default();

    Ok(HttpResponse::Ok().json(UserResponse::new(user, projects)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/login").route(web::post().to(login)))
        .service(web::resource("/register").route(web::post().to(register)))
        .service(web::resource("/me").route(web::get().to(me)));
}
