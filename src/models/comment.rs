//! Comment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::comment;

/// Author name shown once the author account is gone.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Body of `POST /test-results/{id}/comments`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub comment_text: String,
}

/// A comment with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub test_report_id: i32,
    pub user_id: Option<i32>,
    pub username: String,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(m: comment::Model, username: Option<String>) -> Self {
        Self {
            id: m.id,
            test_report_id: m.test_report_id,
            user_id: m.user_id,
            username: username.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            comment_text: m.comment_text,
            created_at: m.created_at,
        }
    }
}
