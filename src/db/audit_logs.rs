//! Database operations for the audit trail.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};

use crate::entity::audit_log::{self, ActiveModel, Entity as AuditLog};
use crate::error::{AppError, AppResult};
use crate::models::NewAuditEntry;

use super::DbPool;

/// Append an audit entry on the caller's connection or transaction.
pub(crate) async fn record<C: ConnectionTrait>(conn: &C, entry: NewAuditEntry) -> AppResult<()> {
    let model = ActiveModel {
        user_id: Set(Some(entry.user_id)),
        action: Set(entry.action.to_string()),
        resource_type: Set(entry.resource_type.to_string()),
        resource_id: Set(entry.resource_id),
        details: Set(entry.details),
        timestamp: Set(Utc::now()),
        ..Default::default()
    };

    model
        .insert(conn)
        .await
        .map_err(|e| AppError::Database(format!("Failed to write audit entry: {}", e)))?;

    tracing::info!(
        actor = entry.user_id,
        action = entry.action,
        resource_type = entry.resource_type,
        resource_id = ?entry.resource_id,
        "Audit entry recorded"
    );

    Ok(())
}

impl DbPool {
    /// All audit entries, newest first.
    pub async fn list_audit_logs(&self) -> AppResult<Vec<audit_log::Model>> {
        AuditLog::find()
            .order_by_desc(audit_log::Column::Timestamp)
            .order_by_desc(audit_log::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list audit logs: {}", e)))
    }
}
