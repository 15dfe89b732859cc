//! Actix-web extractors for bearer-token authentication.
//!
//! The token only identifies the caller; role and project assignments are
//! reloaded from the database on every request.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use super::{CurrentUser, TokenSigner};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::Role;

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn authenticate(
    pool: web::Data<DbPool>,
    signer: web::Data<TokenSigner>,
    token: String,
) -> Result<CurrentUser, AppError> {
    let claims = signer.verify(&token)?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))?;

    let user = pool
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    let role = Role::parse(&user.role)
        .ok_or_else(|| AppError::Internal(format!("Unknown role '{}' on user {}", user.role, user.id)))?;

    let project_ids = pool.assigned_project_ids(user.id).await?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username,
        role,
        project_ids,
    })
}

/// Extractor that requires a valid bearer token.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> AppResult<HttpResponse> {
///     let visibility = auth.user.visibility();
/// }
/// ```
pub struct AuthUser {
    pub user: CurrentUser,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let signer = req.app_data::<web::Data<TokenSigner>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let (Some(pool), Some(signer)) = (pool, signer) else {
                return Err(AppError::Internal(
                    "Authentication is not configured".to_string(),
                ));
            };
            let token = token.ok_or_else(|| {
                AppError::Unauthorized(
                    "Missing bearer token. Provide an Authorization header.".to_string(),
                )
            })?;

            let user = authenticate(pool, signer, token).await?;
            Ok(AuthUser { user })
        })
    }
}

/// Extractor that requires an authenticated admin.
pub struct AdminUser {
    pub user: CurrentUser,
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let auth = AuthUser::from_request(req, payload);

        Box::pin(async move {
            let AuthUser { user } = auth.await?;
            if !user.role.is_admin() {
                return Err(AppError::Forbidden("Admin role required".to_string()));
            }
            Ok(AdminUser { user })
        })
    }
}
