//! Lookup of public user summaries (username, name, avatar).

use std::collections::HashMap;

use serde::Serialize;
use universe_common::AppResult;
use universe_db::{
    entities::{profile, user},
    repositories::{ProfileRepository, UserRepository},
};

/// Public view of a user as embedded in posts, comments and lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Build a summary from a user row and its profile, if any.
    #[must_use]
    pub fn from_parts(user: &user::Model, profile: Option<&profile::Model>) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        }
    }
}

/// Resolves user IDs to [`UserSummary`] values.
#[derive(Clone)]
pub struct UserDirectory {
    user_repo: UserRepository,
    profile_repo: ProfileRepository,
}

impl UserDirectory {
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: ProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
        }
    }

    /// Summaries keyed by user ID. Unknown IDs are skipped.
    pub async fn summaries(&self, ids: &[String]) -> AppResult<HashMap<String, UserSummary>> {
        let mut unique: Vec<String> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let users = self.user_repo.find_by_ids(&unique).await?;
        if users.is_empty() {
            return Ok(HashMap::new());
        }
        let profiles: HashMap<String, profile::Model> = self
            .profile_repo
            .find_by_user_ids(&unique)
            .await?
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();

        Ok(users
            .iter()
            .map(|u| {
                (
                    u.id.clone(),
                    UserSummary::from_parts(u, profiles.get(&u.id)),
                )
            })
            .collect())
    }

    /// Summary of a single known user.
    pub async fn summary_of(&self, user: &user::Model) -> AppResult<UserSummary> {
        let profile = self.profile_repo.find_by_user_id(&user.id).await?;
        Ok(UserSummary::from_parts(user, profile.as_ref()))
    }

    /// Look a user up by handle, case-insensitively.
    pub async fn resolve(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }
}

/// Placeholder for an author whose row disappeared mid-request.
#[must_use]
pub(crate) fn unknown_user(id: &str) -> UserSummary {
    UserSummary {
        id: id.to_string(),
        username: String::new(),
        first_name: None,
        last_name: None,
        avatar_url: None,
    }
}

/// Look up a summary in a map, falling back to [`unknown_user`].
#[must_use]
pub(crate) fn summary_or_unknown(map: &HashMap<String, UserSummary>, id: &str) -> UserSummary {
    map.get(id).cloned().unwrap_or_else(|| unknown_user(id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    //! Fixtures shared by service tests.

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use universe_db::entities::{profile, user};

    pub fn user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            first_name: None,
            last_name: None,
            password_hash: String::new(),
            token: Some(format!("token-{id}")),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub fn profile(user_id: &str, avatar: Option<&str>) -> profile::Model {
        profile::Model {
            user_id: user_id.to_string(),
            bio: None,
            avatar_url: avatar.map(ToString::to_string),
            cover_url: None,
            location: None,
            website: None,
            birth_date: None,
            updated_at: None,
        }
    }

    pub fn empty_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::{profile, user};
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_summaries_join_avatar() {
        let users_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user("u1", "alice"), user("u2", "bob")]])
                .into_connection(),
        );
        let profiles_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[profile("u1", Some("https://cdn.example.com/a.png"))]])
                .into_connection(),
        );

        let directory =
            UserDirectory::new(UserRepository::new(users_db), ProfileRepository::new(profiles_db));
        let map = directory
            .summaries(&["u1".to_string(), "u2".to_string(), "u1".to_string()])
            .await
            .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(
            map["u1"].avatar_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(map["u2"].avatar_url, None);
    }

    #[test]
    fn test_summary_or_unknown() {
        let map = HashMap::new();
        let s = summary_or_unknown(&map, "gone");
        assert_eq!(s.id, "gone");
        assert!(s.username.is_empty());
    }
}
