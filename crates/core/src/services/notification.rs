//! Notification service.
//!
//! Fanout is synchronous and in-line with the causing action. Callers treat a
//! failed fanout as a secondary failure: they log it and carry on.

use chrono::{DateTime, FixedOffset};
use sea_orm::Set;
use serde::Serialize;
use universe_common::{AppResult, IdGenerator};
use universe_db::{
    entities::notification::{self, NotificationKind},
    repositories::NotificationRepository,
};

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};

/// Notifications per page.
const LIST_LIMIT: u64 = 50;

/// A notification rendered for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub actor: UserSummary,
    pub post_id: Option<String>,
    pub message: String,
    pub link: String,
    /// Read state before this listing marked the page read.
    pub is_read: bool,
    pub created_at: DateTime<FixedOffset>,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    directory: UserDirectory,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, directory: UserDirectory) -> Self {
        Self {
            notification_repo,
            directory,
            id_gen: IdGenerator::new(),
        }
    }

    /// Write a notification addressed to `target_id`.
    ///
    /// Returns `None` without touching storage when the actor is the target.
    pub async fn notify(
        &self,
        target_id: &str,
        actor_id: &str,
        kind: NotificationKind,
        post_id: Option<&str>,
    ) -> AppResult<Option<notification::Model>> {
        if target_id == actor_id {
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            target_id: Set(target_id.to_string()),
            actor_id: Set(actor_id.to_string()),
            kind: Set(kind),
            post_id: Set(post_id.map(ToString::to_string)),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;
        tracing::debug!(target = %target_id, actor = %actor_id, kind = ?kind, "Notification created");
        Ok(Some(created))
    }

    /// Like [`Self::notify`], but logs and swallows storage errors.
    pub async fn notify_quietly(
        &self,
        target_id: &str,
        actor_id: &str,
        kind: NotificationKind,
        post_id: Option<&str>,
    ) {
        if let Err(e) = self.notify(target_id, actor_id, kind, post_id).await {
            tracing::warn!(error = %e, target = %target_id, kind = ?kind, "Failed to create notification");
        }
    }

    /// List a page of a user's notifications newest first, then mark that page read.
    ///
    /// Notifications beyond the page, or created after the listing, stay unread.
    pub async fn list_and_mark_read(
        &self,
        user_id: &str,
        until_id: Option<&str>,
    ) -> AppResult<Vec<NotificationView>> {
        let notifications = self
            .notification_repo
            .find_by_target(user_id, LIST_LIMIT, until_id)
            .await?;

        let unread_ids: Vec<String> = notifications
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect();

        let actor_ids: Vec<String> = notifications.iter().map(|n| n.actor_id.clone()).collect();
        let actors = self.directory.summaries(&actor_ids).await?;

        let views = notifications
            .into_iter()
            .map(|n| {
                let actor = summary_or_unknown(&actors, &n.actor_id);
                NotificationView {
                    message: render_message(n.kind, &actor.username),
                    link: render_link(n.kind, &actor.username),
                    id: n.id,
                    kind: n.kind,
                    actor,
                    post_id: n.post_id,
                    is_read: n.is_read,
                    created_at: n.created_at,
                }
            })
            .collect();

        let marked = self.notification_repo.mark_read(user_id, &unread_ids).await?;
        tracing::debug!(user = %user_id, marked, "Marked notifications read");

        Ok(views)
    }

    /// Count unread notifications.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

/// Human readable text for a notification.
#[must_use]
pub fn render_message(kind: NotificationKind, actor: &str) -> String {
    match kind {
        NotificationKind::Like => format!("{actor} liked your post"),
        NotificationKind::Comment => format!("{actor} commented on your post"),
        NotificationKind::Follow => format!("{actor} started following you"),
        NotificationKind::Message => format!("{actor} sent you a message"),
    }
}

/// Where a notification points to.
#[must_use]
pub fn render_link(kind: NotificationKind, actor: &str) -> String {
    match kind {
        NotificationKind::Follow => format!("/profile/{actor}/"),
        NotificationKind::Message => format!("/messages/{actor}/"),
        NotificationKind::Like | NotificationKind::Comment => "/".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::directory::test_support::{empty_db, user};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use universe_db::repositories::{ProfileRepository, UserRepository};

    fn create_test_notification(id: &str, kind: NotificationKind, is_read: bool) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            target_id: "bob".to_string(),
            actor_id: "alice".to_string(),
            kind,
            post_id: None,
            is_read,
            created_at: Utc::now().into(),
        }
    }

    fn directory_with(users: Vec<universe_db::entities::user::Model>) -> UserDirectory {
        let users_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([users])
                .into_connection(),
        );
        let profiles_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<universe_db::entities::profile::Model>::new()])
                .into_connection(),
        );
        UserDirectory::new(
            UserRepository::new(users_db),
            ProfileRepository::new(profiles_db),
        )
    }

    #[tokio::test]
    async fn test_notify_self_is_noop() {
        let service = NotificationService::new(
            NotificationRepository::new(empty_db()),
            UserDirectory::new(UserRepository::new(empty_db()), ProfileRepository::new(empty_db())),
        );

        let result = service
            .notify("alice", "alice", NotificationKind::Like, Some("p1"))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_notify_creates_record() {
        let created = create_test_notification("n1", NotificationKind::Follow, false);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(db),
            UserDirectory::new(UserRepository::new(empty_db()), ProfileRepository::new(empty_db())),
        );

        let result = service
            .notify("bob", "alice", NotificationKind::Follow, None)
            .await
            .unwrap();

        assert_eq!(result.unwrap().kind, NotificationKind::Follow);
    }

    #[tokio::test]
    async fn test_list_and_mark_read_renders_and_marks_listed_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_notification("n2", NotificationKind::Message, false),
                    create_test_notification("n1", NotificationKind::Follow, true),
                ]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(db.clone()),
            directory_with(vec![user("alice", "alice")]),
        );

        let views = service.list_and_mark_read("bob", None).await.unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].message, "alice sent you a message");
        assert_eq!(views[0].link, "/messages/alice/");
        assert!(!views[0].is_read);
        assert_eq!(views[1].link, "/profile/alice/");

        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 2);
        let update = &log[1].statements()[0];
        assert!(update.sql.contains(r#""notification"."id" IN ($3)"#));
        let values = &update.values.as_ref().unwrap().0;
        assert!(values.contains(&sea_orm::Value::from("n2")));
        assert!(!values.contains(&sea_orm::Value::from("n1")));
    }

    #[tokio::test]
    async fn test_list_with_nothing_unread_skips_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification(
                    "n1",
                    NotificationKind::Follow,
                    true,
                )]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(db.clone()),
            directory_with(vec![user("alice", "alice")]),
        );

        let views = service.list_and_mark_read("bob", None).await.unwrap();
        assert_eq!(views.len(), 1);

        drop(service);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_render_message() {
        assert_eq!(
            render_message(NotificationKind::Like, "carol"),
            "carol liked your post"
        );
        assert_eq!(
            render_message(NotificationKind::Comment, "carol"),
            "carol commented on your post"
        );
        assert_eq!(render_link(NotificationKind::Like, "carol"), "/");
    }
}
