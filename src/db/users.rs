//! Database operations for users and their project assignments.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;

use crate::entity::{
    audit_log, comment, favorite_project, project,
    user::{self, ActiveModel, Entity as User},
    user_project,
};
use crate::error::{AppError, AppResult};
use crate::models::audit_log::{action, resource};
use crate::models::{NewAuditEntry, ProjectSummary, Role};

use super::{DbPool, audit_logs};

impl DbPool {
    /// Get a user by ID.
    pub async fn get_user(&self, id: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get user: {}", e)))
    }

    /// Get a user by exact username.
    pub async fn find_user_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find user: {}", e)))
    }

    /// Insert a user. Taken usernames are rejected.
    pub async fn create_user(
        &self,
        username: &str,
        hashed_password: String,
        role: Role,
    ) -> AppResult<user::Model> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Username '{}' is already registered",
                username
            )));
        }

        let model = ActiveModel {
            username: Set(username.to_string()),
            hashed_password: Set(hashed_password),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert user: {}", e)))
    }

    /// All users ordered by ID.
    pub async fn list_users(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_asc(user::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list users: {}", e)))
    }

    /// IDs of the projects assigned to a user.
    pub async fn assigned_project_ids(&self, user_id: i32) -> AppResult<Vec<i32>> {
        let rows = user_project::Entity::find()
            .filter(user_project::Column::UserId.eq(user_id))
            .order_by_asc(user_project::Column::ProjectId)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load assignments: {}", e)))?;

        Ok(rows.into_iter().map(|r| r.project_id).collect())
    }

    /// Assigned projects for each of the given users.
    pub async fn projects_by_user(
        &self,
        user_ids: &[i32],
    ) -> AppResult<HashMap<i32, Vec<ProjectSummary>>> {
        let mut by_user: HashMap<i32, Vec<ProjectSummary>> = HashMap::new();
        if user_ids.is_empty() {
            return Ok(by_user);
        }

        let assignments = user_project::Entity::find()
            .filter(user_project::Column::UserId.is_in(user_ids.iter().copied()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load assignments: {}", e)))?;

        let project_ids: Vec<i32> = assignments.iter().map(|a| a.project_id).collect();
        let projects: HashMap<i32, project::Model> = if project_ids.is_empty() {
            HashMap::new()
        } else {
            project::Entity::find()
                .filter(project::Column::Id.is_in(project_ids))
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to load projects: {}", e)))?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        for a in assignments {
            if let Some(p) = projects.get(&a.project_id) {
                by_user
                    .entry(a.user_id)
                    .or_default()
                    .push(ProjectSummary::from(p.clone()));
            }
        }
        for list in by_user.values_mut() {
            list.sort_by_key(|p| p.id);
        }

        Ok(by_user)
    }

    /// Change a user's role and record it.
    pub async fn update_user_role(
        &self,
        actor_id: i32,
        user_id: i32,
        role: Role,
    ) -> AppResult<user::Model> {
        let txn = self.connection().begin().await?;

        let existing = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;
        let old_role = existing.role.clone();

        let mut active: ActiveModel = existing.into();
        active.role = Set(role.as_str().to_string());
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user role: {}", e)))?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::UPDATE_ROLE,
                resource_type: resource::USER,
                resource_id: Some(user_id),
                details: Some(json!({"Old Role": old_role, "New Role": updated.role})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Set a role by username without auditing (used by the admin CLI).
    pub async fn set_user_role(&self, username: &str, role: Role) -> AppResult<user::Model> {
        let existing = self
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}'", username)))?;

        let mut active: ActiveModel = existing.into();
        active.role = Set(role.as_str().to_string());
        active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update user role: {}", e)))
    }

    /// Delete a user, detaching their comments and audit rows.
    pub async fn delete_user(&self, actor_id: i32, user_id: i32) -> AppResult<user::Model> {
        if actor_id == user_id {
            return Err(AppError::InvalidInput(
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        let txn = self.connection().begin().await?;

        let existing = User::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

        user_project::Entity::delete_many()
            .filter(user_project::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        favorite_project::Entity::delete_many()
            .filter(favorite_project::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        comment::Entity::update_many()
            .col_expr(comment::Column::UserId, Expr::value(Option::<i32>::None))
            .filter(comment::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        audit_log::Entity::update_many()
            .col_expr(audit_log::Column::UserId, Expr::value(Option::<i32>::None))
            .filter(audit_log::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        User::delete_by_id(user_id).exec(&txn).await?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::DELETE_USER,
                resource_type: resource::USER,
                resource_id: Some(user_id),
                details: Some(json!({"Username": existing.username})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(existing)
    }
}
