//! Database operations for comments on test runs.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::comment::{self, ActiveModel, Entity as Comment};
use crate::entity::user;
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Add a comment to a run.
    pub async fn add_comment(
        &self,
        test_report_id: i32,
        user_id: i32,
        text: &str,
    ) -> AppResult<comment::Model> {
        ActiveModel {
            test_report_id: Set(test_report_id),
            user_id: Set(Some(user_id)),
            comment_text: Set(text.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.connection())
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert comment: {}", e)))
    }

    /// Comments on a run, newest first, paired with their author's username.
    pub async fn list_comments(
        &self,
        test_report_id: i32,
    ) -> AppResult<Vec<(comment::Model, Option<String>)>> {
        let comments = Comment::find()
            .filter(comment::Column::TestReportId.eq(test_report_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list comments: {}", e)))?;

        let mut author_ids: Vec<i32> = comments.iter().filter_map(|c| c.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i32, String> = if author_ids.is_empty() {
            HashMap::new()
        } else {
            user::Entity::find()
                .filter(user::Column::Id.is_in(author_ids))
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to load comment authors: {}", e)))?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        Ok(comments
            .into_iter()
            .map(|c| {
                let username = c.user_id.and_then(|id| authors.get(&id).cloned());
                (c, username)
            })
            .collect())
    }
}
