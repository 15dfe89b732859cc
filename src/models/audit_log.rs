//! Audit trail models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::audit_log;

/// Recorded action names.
pub mod action {
    pub const CREATE_PROJECT: &str = "Create Project";
    pub const ASSIGN_USER: &str = "Assign user to project";
    pub const UNASSIGN_USER: &str = "Unassign user from project";
    pub const DELETE_PROJECT: &str = "Delete Project";
    pub const UPDATE_SUITE: &str = "Update Test Suite";
    pub const DELETE_SUITE: &str = "Delete Test Suite";
    pub const DELETE_REPORT: &str = "Delete Test Report";
    pub const UPDATE_ROLE: &str = "Update User Role";
    pub const DELETE_USER: &str = "Delete User";
}

/// Resource type names.
pub mod resource {
    pub const PROJECT: &str = "Project";
    pub const SUITE: &str = "Test Suite";
    pub const REPORT: &str = "Test Report";
    pub const USER: &str = "User";
}

/// Entry to append within a mutation's transaction.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: i32,
    pub action: &'static str,
    pub resource_type: &'static str,
    pub resource_id: Option<i32>,
    pub details: Option<serde_json::Value>,
}

/// A stored audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    pub id: i32,
    pub user_id: Option<i32>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<i32>,
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl From<audit_log::Model> for AuditLogResponse {
    fn from(m: audit_log::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            action: m.action,
            resource_type: m.resource_type,
            resource_id: m.resource_id,
            details: m.details,
            timestamp: m.timestamp,
        }
    }
}
