//! Database repositories.

mod comment;
mod following;
mod group;
mod group_post;
mod highlight;
mod messaging;
mod notification;
mod playlist;
mod post;
mod post_like;
mod profile;
mod story;
mod user;
mod video;

use std::collections::HashMap;

use sea_orm::FromQueryResult;

pub use comment::CommentRepository;
pub use following::{FollowerCount, FollowingRepository};
pub use group::GroupRepository;
pub use group_post::GroupPostRepository;
pub use highlight::HighlightRepository;
pub use messaging::MessageRepository;
pub use notification::NotificationRepository;
pub use playlist::PlaylistRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use profile::ProfileRepository;
pub use story::StoryRepository;
pub use user::UserRepository;
pub use video::VideoRepository;

/// A row of a `GROUP BY key` count query.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct GroupedCount {
    pub key: String,
    pub count: i64,
}

/// Collect grouped count rows into a lookup map.
#[must_use]
pub fn counts_by_key(rows: Vec<GroupedCount>) -> HashMap<String, i64> {
    rows.into_iter().map(|r| (r.key, r.count)).collect()
}

/// Lowercased `%query%` pattern for a `LIKE` match with the wildcards in `query` escaped.
///
/// The escape character itself is escaped first so a trailing `\` cannot swallow the closing `%`.
pub(crate) fn contains_pattern(query: &str) -> String {
    let escaped = query
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Ali"), "%ali%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_contains_pattern_escapes_backslash() {
        assert_eq!(contains_pattern("foo\\"), "%foo\\\\%");
        assert_eq!(contains_pattern("a\\%b"), "%a\\\\\\%b%");
    }
}
