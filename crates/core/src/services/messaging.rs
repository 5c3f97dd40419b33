//! Messaging service for direct messages.

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{message, notification::NotificationKind},
    repositories::{MessageRepository, UserRepository},
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};
use crate::services::notification::NotificationService;

/// Input for sending a message.
#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageInput {
    #[validate(
        length(min = 1, max = 5000),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub content: String,
}

/// Conversation summary for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub partner: UserSummary,
    pub last_message: message::Model,
    pub unread_count: u64,
}

/// A thread with one partner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub partner: UserSummary,
    pub messages: Vec<message::Model>,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    user_repo: UserRepository,
    directory: UserDirectory,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        user_repo: UserRepository,
        directory: UserDirectory,
        notifications: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
            directory,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to the user called `recipient_username`.
    pub async fn send(
        &self,
        sender_id: &str,
        recipient_username: &str,
        input: SendMessageInput,
    ) -> AppResult<message::Model> {
        input.validate()?;

        let recipient = self.user_repo.get_by_username(recipient_username).await?;
        if recipient.id == sender_id {
            return Err(AppError::BadRequest(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient.id.clone()),
            content: Set(input.content.trim().to_string()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let created = self.message_repo.create(model).await?;

        self.notifications
            .notify_quietly(&recipient.id, sender_id, NotificationKind::Message, None)
            .await;

        Ok(created)
    }

    /// One entry per partner, most recent conversation first.
    pub async fn conversations(&self, user_id: &str) -> AppResult<Vec<ConversationSummary>> {
        let partner_ids = self.message_repo.partner_ids(user_id).await?;
        if partner_ids.is_empty() {
            return Ok(vec![]);
        }

        let unread = self.message_repo.count_unread_by_sender(user_id).await?;
        let partners = self.directory.summaries(&partner_ids).await?;

        let mut conversations = Vec::with_capacity(partner_ids.len());
        for partner_id in &partner_ids {
            let Some(last_message) = self
                .message_repo
                .find_latest_between(user_id, partner_id)
                .await?
            else {
                continue;
            };
            conversations.push(ConversationSummary {
                partner: summary_or_unknown(&partners, partner_id),
                unread_count: unread
                    .get(partner_id)
                    .map_or(0, |&n| u64::try_from(n).unwrap_or(0)),
                last_message,
            });
        }

        conversations.sort_by(|a, b| {
            b.last_message
                .created_at
                .cmp(&a.last_message.created_at)
                .then_with(|| b.last_message.id.cmp(&a.last_message.id))
        });
        Ok(conversations)
    }

    /// Open the thread with `partner_username`.
    ///
    /// Unread messages from the partner to the user become read. Messages the
    /// user sent are left alone.
    pub async fn open_thread(&self, user_id: &str, partner_username: &str) -> AppResult<Thread> {
        let partner = self.user_repo.get_by_username(partner_username).await?;

        let marked = self
            .message_repo
            .mark_read_from(&partner.id, user_id)
            .await?;
        if marked > 0 {
            tracing::debug!(user = %user_id, partner = %partner.id, marked, "Marked messages read");
        }

        let messages = self.message_repo.find_thread(user_id, &partner.id).await?;
        let partner = self.directory.summary_of(&partner).await?;

        Ok(Thread { partner, messages })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, user};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use universe_db::entities::profile;
    use universe_db::repositories::{NotificationRepository, ProfileRepository};

    fn msg(id: &str, from: &str, to: &str, is_read: bool, minutes_ago: i64) -> message::Model {
        message::Model {
            id: id.to_string(),
            sender_id: from.to_string(),
            recipient_id: to.to_string(),
            content: format!("message {id}"),
            is_read,
            created_at: (Utc::now() - chrono::Duration::minutes(minutes_ago)).into(),
        }
    }

    fn service(
        messages: Arc<DatabaseConnection>,
        users: Arc<DatabaseConnection>,
        directory_users: Arc<DatabaseConnection>,
        directory_profiles: Arc<DatabaseConnection>,
    ) -> MessagingService {
        let directory = UserDirectory::new(
            UserRepository::new(directory_users),
            ProfileRepository::new(directory_profiles),
        );
        MessagingService::new(
            MessageRepository::new(messages),
            UserRepository::new(users),
            directory.clone(),
            NotificationService::new(NotificationRepository::new(empty_db()), directory),
        )
    }

    #[tokio::test]
    async fn test_send_to_self_rejected() {
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("alice", "alice")]])
                .into_connection(),
        );

        let result = service(empty_db(), users, empty_db(), empty_db())
            .send(
                "alice",
                "alice",
                SendMessageInput {
                    content: "hi me".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_send_blank_rejected() {
        let result = service(empty_db(), empty_db(), empty_db(), empty_db())
            .send(
                "alice",
                "bob",
                SendMessageInput {
                    content: "  ".to_string(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_conversations_one_entry_per_partner() {
        let messages = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // partners alice wrote to, then partners who wrote to alice
                .append_query_results([[
                    maplit::btreemap! { "recipient_id" => sea_orm::Value::from("bob") },
                    maplit::btreemap! { "recipient_id" => sea_orm::Value::from("dave") },
                ]])
                .append_query_results([[
                    maplit::btreemap! { "sender_id" => sea_orm::Value::from("bob") },
                    maplit::btreemap! { "sender_id" => sea_orm::Value::from("carol") },
                ]])
                .append_query_results([[maplit::btreemap! {
                    "key" => sea_orm::Value::from("bob"),
                    "count" => sea_orm::Value::BigInt(Some(1)),
                }]])
                // latest message per partner, in partner id order
                .append_query_results([[msg("m3", "bob", "alice", false, 2)]])
                .append_query_results([[msg("m4", "carol", "alice", false, 1)]])
                .append_query_results([[msg("m0", "alice", "dave", true, 60 * 24 * 365)]])
                .into_connection(),
        );
        let directory_users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    user("bob", "bob"),
                    user("carol", "carol"),
                    user("dave", "dave"),
                ]])
                .into_connection(),
        );
        let directory_profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let conversations = service(messages, empty_db(), directory_users, directory_profiles)
            .conversations("alice")
            .await
            .unwrap();

        assert_eq!(conversations.len(), 3);
        assert_eq!(conversations[0].partner.username, "carol");
        assert_eq!(conversations[1].partner.username, "bob");
        assert_eq!(conversations[1].last_message.id, "m3");
        assert_eq!(conversations[1].unread_count, 1);
        assert_eq!(conversations[2].partner.username, "dave");
        assert_eq!(conversations[2].unread_count, 0);
    }

    #[tokio::test]
    async fn test_conversations_empty_inbox() {
        let messages = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .append_query_results([Vec::<std::collections::BTreeMap<&str, sea_orm::Value>>::new()])
                .into_connection(),
        );

        let conversations = service(messages, empty_db(), empty_db(), empty_db())
            .conversations("alice")
            .await
            .unwrap();

        assert!(conversations.is_empty());
    }

    #[tokio::test]
    async fn test_open_thread_marks_partner_messages() {
        let messages = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .append_query_results([[
                    msg("m1", "alice", "bob", true, 3),
                    msg("m2", "alice", "bob", true, 2),
                    msg("m3", "bob", "alice", false, 1),
                ]])
                .into_connection(),
        );
        let users = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("alice", "alice")]])
                .into_connection(),
        );
        let directory_profiles = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<profile::Model>::new()])
                .into_connection(),
        );

        let thread = service(messages, users, empty_db(), directory_profiles)
            .open_thread("bob", "alice")
            .await
            .unwrap();

        assert_eq!(thread.partner.username, "alice");
        assert_eq!(thread.messages.len(), 3);
        assert_eq!(thread.messages[0].id, "m1");
    }
}
