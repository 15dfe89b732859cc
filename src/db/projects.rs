//! Database operations for projects, assignments and favourites.

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;

use crate::auth::Visibility;
use crate::entity::{
    favorite_project,
    project::{self, ActiveModel, Entity as Project},
    test_report, test_suite, user, user_project,
};
use crate::error::{AppError, AppResult};
use crate::models::NewAuditEntry;
use crate::models::audit_log::{action, resource};

use super::{DbPool, audit_logs, contains_pattern};

impl DbPool {
    /// Get a project by ID.
    pub async fn get_project(&self, id: i32) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get project: {}", e)))
    }

    /// Create a project and record it.
    pub async fn create_project(&self, actor_id: i32, name: &str) -> AppResult<project::Model> {
        let txn = self.connection().begin().await?;

        let taken = Project::find()
            .filter(project::Column::ProjectName.eq(name))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Project '{}' already exists",
                name
            )));
        }

        let created = ActiveModel {
            project_name: Set(name.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert project: {}", e)))?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::CREATE_PROJECT,
                resource_type: resource::PROJECT,
                resource_id: Some(created.id),
                details: Some(json!({"Project Name": created.project_name})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    /// All projects ordered by ID.
    pub async fn list_projects(&self) -> AppResult<Vec<project::Model>> {
        Project::find()
            .order_by_asc(project::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list projects: {}", e)))
    }

    /// Projects within a visibility scope, optionally matching a name substring.
    pub async fn list_visible_projects(
        &self,
        visibility: &Visibility,
        name_filter: Option<&str>,
    ) -> AppResult<Vec<project::Model>> {
        let mut select = Project::find();

        if let Visibility::Projects(ids) = visibility {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(project::Column::Id.is_in(ids.iter().copied()));
        }

        if let Some(name) = name_filter {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((Project, project::Column::ProjectName))))
                    .like(contains_pattern(name)),
            );
        }

        select
            .order_by_asc(project::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list projects: {}", e)))
    }

    /// Assign a user to a project. Returns whether a new assignment was made.
    pub async fn assign_user_to_project(
        &self,
        actor_id: i32,
        project_id: i32,
        user_id: i32,
    ) -> AppResult<(project::Model, user::Model, bool)> {
        let txn = self.connection().begin().await?;

        let project = Project::find_by_id(project_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;
        let user = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

        let existing = user_project::Entity::find_by_id((user_id, project_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok((project, user, false));
        }

        user_project::ActiveModel {
            user_id: Set(user_id),
            project_id: Set(project_id),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to assign user: {}", e)))?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::ASSIGN_USER,
                resource_type: resource::PROJECT,
                resource_id: Some(project_id),
                details: Some(json!({"Assigned User ID": user_id, "Username": user.username})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok((project, user, true))
    }

    /// Remove a user's assignment to a project.
    pub async fn unassign_user_from_project(
        &self,
        actor_id: i32,
        user_id: i32,
        project_id: i32,
    ) -> AppResult<(project::Model, user::Model)> {
        let txn = self.connection().begin().await?;

        let user = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        let project = Project::find_by_id(project_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;

        let removed = user_project::Entity::delete_by_id((user_id, project_id))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(AppError::InvalidInput(format!(
                "User {} is not assigned to project {}",
                user.username, project.project_name
            )));
        }

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::UNASSIGN_USER,
                resource_type: resource::PROJECT,
                resource_id: Some(project_id),
                details: Some(json!({"Unassigned User ID": user_id, "Username": user.username})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok((project, user))
    }

    /// Delete a project, detaching its suites and runs.
    pub async fn delete_project(&self, actor_id: i32, project_id: i32) -> AppResult<project::Model> {
        let txn = self.connection().begin().await?;

        let existing = Project::find_by_id(project_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?;

        user_project::Entity::delete_many()
            .filter(user_project::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;
        favorite_project::Entity::delete_many()
            .filter(favorite_project::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;
        test_suite::Entity::update_many()
            .col_expr(test_suite::Column::ProjectId, Expr::value(Option::<i32>::None))
            .filter(test_suite::Column::ProjectId.eq(project_id))
            .exec(&txn)
            .await?;
        test_report::Entity::update_many()
            .col_expr(test_report::Column::TestProjectId, Expr::value(Option::<i32>::None))
            .filter(test_report::Column::TestProjectId.eq(project_id))
            .exec(&txn)
            .await?;
        Project::delete_by_id(project_id).exec(&txn).await?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::DELETE_PROJECT,
                resource_type: resource::PROJECT,
                resource_id: Some(project_id),
                details: Some(json!({"Project Name": existing.project_name})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(existing)
    }

    /// Mark a project as a favourite of a user.
    pub async fn add_favorite_project(
        &self,
        user_id: i32,
        project_id: i32,
    ) -> AppResult<favorite_project::Model> {
        let existing = favorite_project::Entity::find()
            .filter(favorite_project::Column::UserId.eq(user_id))
            .filter(favorite_project::Column::ProjectId.eq(project_id))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up favourite: {}", e)))?;
        if existing.is_some() {
            return Err(AppError::InvalidInput(
                "Project already favourited".to_string(),
            ));
        }

        favorite_project::ActiveModel {
            user_id: Set(user_id),
            project_id: Set(project_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert favourite: {}", e)))
    }

    /// A user's favourite projects ordered by project ID.
    pub async fn list_favorite_projects(&self, user_id: i32) -> AppResult<Vec<project::Model>> {
        let project_ids: Vec<i32> = favorite_project::Entity::find()
            .filter(favorite_project::Column::UserId.eq(user_id))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list favourites: {}", e)))?
            .into_iter()
            .map(|f| f.project_id)
            .collect();

        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        Project::find()
            .filter(project::Column::Id.is_in(project_ids))
            .order_by_asc(project::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list favourites: {}", e)))
    }

    /// Remove a favourite marker.
    pub async fn remove_favorite_project(&self, user_id: i32, project_id: i32) -> AppResult<()> {
        let removed = favorite_project::Entity::delete_many()
            .filter(favorite_project::Column::UserId.eq(user_id))
            .filter(favorite_project::Column::ProjectId.eq(project_id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to remove favourite: {}", e)))?;

        if removed.rows_affected == 0 {
            return Err(AppError::NotFound("Favourite project".to_string()));
        }
        Ok(())
    }
}
