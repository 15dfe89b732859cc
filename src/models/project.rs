//! Project, assignment and favourite models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::{favorite_project, project};

/// Body of `POST /projects/`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub project_name: String,
}

/// A project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<project::Model> for ProjectResponse {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            project_name: m.project_name,
            created_at: m.created_at,
        }
    }
}

/// Project reference embedded in user responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectSummary {
    pub id: i32,
    pub project_name: String,
}

impl From<project::Model> for ProjectSummary {
    fn from(m: project::Model) -> Self {
        Self {
            id: m.id,
            project_name: m.project_name,
        }
    }
}

/// Query of `GET /projects/my`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyProjectsQuery {
    /// Case-insensitive substring of the project name
    pub project_name: Option<String>,
}

/// Query of `POST /projects/{id}/assign-user/`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignUserQuery {
    pub user_id: i32,
}

/// Query of `DELETE /users/{id}/projects`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UnassignProjectQuery {
    pub project_id: i32,
}

/// Body of `POST /favourite-projects/`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FavoriteProjectRequest {
    pub project_id: i32,
}

/// A favourite marker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FavoriteProjectResponse {
    pub id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<favorite_project::Model> for FavoriteProjectResponse {
    fn from(m: favorite_project::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            project_id: m.project_id,
            created_at: m.created_at,
        }
    }
}
