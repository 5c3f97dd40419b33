//! Direct message repository.

use std::collections::HashMap;
use std::sync::Arc;

use super::{GroupedCount, counts_by_key};
use crate::entities::{Message, message};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use universe_common::{AppError, AppResult};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a message.
    pub async fn create(&self, model: message::ActiveModel) -> AppResult<message::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every message exchanged between two users, oldest first.
    pub async fn find_thread(&self, user_a: &str, user_b: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(thread_condition(user_a, user_b))
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every user the given user has exchanged a message with, in either direction.
    pub async fn partner_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let recipients: Vec<String> = Message::find()
            .select_only()
            .column(message::Column::RecipientId)
            .distinct()
            .filter(message::Column::SenderId.eq(user_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let senders: Vec<String> = Message::find()
            .select_only()
            .column(message::Column::SenderId)
            .distinct()
            .filter(message::Column::RecipientId.eq(user_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut ids: Vec<String> = recipients.into_iter().chain(senders).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// The newest message between two users, whichever side sent it.
    pub async fn find_latest_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<message::Model>> {
        Message::find()
            .filter(thread_condition(user_a, user_b))
            .order_by_desc(message::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages addressed to `recipient_id`, counted per sender.
    pub async fn count_unread_by_sender(&self, recipient_id: &str) -> AppResult<HashMap<String, i64>> {
        let rows = Message::find()
            .select_only()
            .column_as(message::Column::SenderId, "key")
            .column_as(message::Column::Id.count(), "count")
            .filter(message::Column::RecipientId.eq(recipient_id))
            .filter(message::Column::IsRead.eq(false))
            .group_by(message::Column::SenderId)
            .into_model::<GroupedCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(counts_by_key(rows))
    }

    /// Mark every unread message from `sender_id` to `recipient_id` as read.
    ///
    /// Only one direction of the thread is touched.
    pub async fn mark_read_from(&self, sender_id: &str, recipient_id: &str) -> AppResult<u64> {
        let result = Message::update_many()
            .col_expr(message::Column::IsRead, Expr::value(true))
            .filter(message::Column::SenderId.eq(sender_id))
            .filter(message::Column::RecipientId.eq(recipient_id))
            .filter(message::Column::IsRead.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Count unread messages addressed to a user.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::RecipientId.eq(recipient_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn thread_condition(user_a: &str, user_b: &str) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(message::Column::SenderId.eq(user_a))
                .add(message::Column::RecipientId.eq(user_b)),
        )
        .add(
            Condition::all()
                .add(message::Column::SenderId.eq(user_b))
                .add(message::Column::RecipientId.eq(user_a)),
        )
}
