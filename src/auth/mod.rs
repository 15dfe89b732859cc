//! Authentication: password hashing, access tokens and request extractors.

mod extractor;
pub mod password;
pub mod token;

pub use extractor::{AdminUser, AuthUser};
pub use token::{AccessClaims, TokenSigner};

use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Authenticated caller, loaded fresh for each request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub project_ids: Vec<i32>,
}

/// Which runs and projects a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Assigned projects only; runs without a project are excluded
    Projects(Vec<i32>),
}

impl Visibility {
    pub fn allows(&self, project_id: Option<i32>) -> bool {
        match self {
            Self::All => true,
            Self::Projects(ids) => project_id.is_some_and(|id| ids.contains(&id)),
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_admin() {
            Visibility::All
        } else {
            Visibility::Projects(self.project_ids.clone())
        }
    }

    /// Fail with 403 unless the caller may act on `project_id`.
    pub fn ensure_project_access(&self, project_id: i32) -> AppResult<()> {
        if self.visibility().allows(Some(project_id)) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Not authorized for project {}",
                project_id
            )))
        }
    }
}
