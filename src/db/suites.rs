//! Database operations for test suites.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;

use crate::entity::test_report;
use crate::entity::test_suite::{self, ActiveModel, Entity as Suite};
use crate::error::{AppError, AppResult};
use crate::models::NewAuditEntry;
use crate::models::audit_log::{action, resource};

use super::{DbPool, audit_logs};

/// Resolve a normalized suite name to its ID, creating the suite if absent.
///
/// Relies on the unique index on `suite_name`: a concurrent insert of the same
/// name is a no-op here and the follow-up lookup finds the winner's row.
pub(crate) async fn resolve_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    project_id: Option<i32>,
) -> AppResult<i32> {
    let candidate = ActiveModel {
        suite_name: Set(name.to_string()),
        project_id: Set(project_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    Suite::insert(candidate)
        .on_conflict(
            OnConflict::column(test_suite::Column::SuiteName)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert suite: {}", e)))?;

    let suite = Suite::find()
        .filter(test_suite::Column::SuiteName.eq(name))
        .one(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up suite: {}", e)))?
        .ok_or_else(|| AppError::Database(format!("Suite '{}' vanished after insert", name)))?;

    Ok(suite.id)
}

impl DbPool {
    /// Get a suite by ID.
    pub async fn get_suite(&self, id: i32) -> AppResult<Option<test_suite::Model>> {
        Suite::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get suite: {}", e)))
    }

    /// Create a suite with an already-normalized name.
    pub async fn create_suite(
        &self,
        name: &str,
        project_id: Option<i32>,
    ) -> AppResult<test_suite::Model> {
        if let Some(pid) = project_id
            && self.get_project(pid).await?.is_none()
        {
            return Err(AppError::NotFound(format!("Project {}", pid)));
        }

        let taken = Suite::find()
            .filter(test_suite::Column::SuiteName.eq(name))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to look up suite: {}", e)))?;
        if taken.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Test suite '{}' already exists",
                name
            )));
        }

        ActiveModel {
            suite_name: Set(name.to_string()),
            project_id: Set(project_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert suite: {}", e)))
    }

    /// Suites ordered by ID, optionally only those of one project.
    pub async fn list_suites(&self, project_id: Option<i32>) -> AppResult<Vec<test_suite::Model>> {
        let mut select = Suite::find();
        if let Some(pid) = project_id {
            select = select.filter(test_suite::Column::ProjectId.eq(pid));
        }

        select
            .order_by_asc(test_suite::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list suites: {}", e)))
    }

    /// Names of the given suites keyed by ID.
    pub async fn suite_names(&self, ids: &[i32]) -> AppResult<HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let suites = Suite::find()
            .filter(test_suite::Column::Id.is_in(ids.iter().copied()))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load suite names: {}", e)))?;

        Ok(suites.into_iter().map(|s| (s.id, s.suite_name)).collect())
    }

    /// Rename a suite and/or move it to another project.
    pub async fn update_suite(
        &self,
        actor_id: i32,
        suite_id: i32,
        name: &str,
        project_id: Option<i32>,
    ) -> AppResult<test_suite::Model> {
        if let Some(pid) = project_id
            && self.get_project(pid).await?.is_none()
        {
            return Err(AppError::NotFound(format!("Project {}", pid)));
        }

        let txn = self.connection().begin().await?;

        let existing = Suite::find_by_id(suite_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {}", suite_id)))?;

        let clash = Suite::find()
            .filter(test_suite::Column::SuiteName.eq(name))
            .filter(test_suite::Column::Id.ne(suite_id))
            .one(&txn)
            .await?;
        if clash.is_some() {
            return Err(AppError::InvalidInput(format!(
                "Test suite '{}' already exists",
                name
            )));
        }

        let mut active: ActiveModel = existing.into();
        active.suite_name = Set(name.to_string());
        active.project_id = Set(project_id);
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to update suite: {}", e)))?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::UPDATE_SUITE,
                resource_type: resource::SUITE,
                resource_id: Some(suite_id),
                details: Some(json!({
                    "New Suite Name": updated.suite_name,
                    "New Project ID": updated.project_id,
                })),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Delete a suite, detaching its runs.
    pub async fn delete_suite(&self, actor_id: i32, suite_id: i32) -> AppResult<test_suite::Model> {
        let txn = self.connection().begin().await?;

        let existing = Suite::find_by_id(suite_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Test suite {}", suite_id)))?;

        test_report::Entity::update_many()
            .col_expr(test_report::Column::TestSuiteId, Expr::value(Option::<i32>::None))
            .filter(test_report::Column::TestSuiteId.eq(suite_id))
            .exec(&txn)
            .await?;
        Suite::delete_by_id(suite_id).exec(&txn).await?;

        audit_logs::record(
            &txn,
            NewAuditEntry {
                user_id: actor_id,
                action: action::DELETE_SUITE,
                resource_type: resource::SUITE,
                resource_id: Some(suite_id),
                details: Some(json!({"Suite Name": existing.suite_name})),
            },
        )
        .await?;

        txn.commit().await?;
        Ok(existing)
    }
}
