//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `universe_test`)
//!   `TEST_DB_PASSWORD` (default: `universe_test`)
//!   `TEST_DB_NAME` (default: `universe_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::Set;
use universe_common::{AppError, IdGenerator};
use universe_db::entities::{following, post, post_like, story, story_view, user};
use universe_db::repositories::{
    FollowingRepository, PostLikeRepository, PostRepository, StoryRepository, UserRepository,
};
use universe_db::test_utils::{TestDatabase, TestDbConfig};

async fn insert_user(repo: &UserRepository, ids: &IdGenerator, username: &str) -> user::Model {
    repo.create(user::ActiveModel {
        id: Set(ids.generate()),
        username: Set(username.to_string()),
        username_lower: Set(username.to_lowercase()),
        email: Set(format!("{}@example.com", username.to_lowercase())),
        first_name: Set(None),
        last_name: Set(None),
        password_hash: Set("x".to_string()),
        token: Set(Some(ids.generate_token())),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    })
    .await
    .expect("insert user")
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_like_is_conflict() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);
    let ids = IdGenerator::new();

    let users = UserRepository::new(Arc::clone(&conn));
    let posts = PostRepository::new(Arc::clone(&conn));
    let likes = PostLikeRepository::new(Arc::clone(&conn));

    let alice = insert_user(&users, &ids, "alice").await;
    let p = posts
        .create(post::ActiveModel {
            id: Set(ids.generate()),
            author_id: Set(alice.id.clone()),
            content: Set("hello".to_string()),
            image_url: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    let like = || post_like::ActiveModel {
        id: Set(ids.generate()),
        user_id: Set(alice.id.clone()),
        post_id: Set(p.id.clone()),
        created_at: Set(Utc::now().into()),
    };

    likes.create(like()).await.unwrap();
    let second = likes.create(like()).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(likes.count_by_post(&p.id).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_self_follow_rejected_by_schema() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);
    let ids = IdGenerator::new();

    let users = UserRepository::new(Arc::clone(&conn));
    let follows = FollowingRepository::new(Arc::clone(&conn));
    let alice = insert_user(&users, &ids, "alice").await;

    let result = follows
        .create(following::ActiveModel {
            id: Set(ids.generate()),
            follower_id: Set(alice.id.clone()),
            followee_id: Set(alice.id.clone()),
            created_at: Set(Utc::now().into()),
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_expired_story_excluded_and_views_unique() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = Arc::new(db.conn);
    let ids = IdGenerator::new();

    let users = UserRepository::new(Arc::clone(&conn));
    let stories = StoryRepository::new(Arc::clone(&conn));
    let bob = insert_user(&users, &ids, "bob").await;
    let carol = insert_user(&users, &ids, "carol").await;

    let old_created = Utc::now() - Duration::hours(25);
    let expired = stories
        .create(story::ActiveModel {
            id: Set(ids.generate()),
            author_id: Set(bob.id.clone()),
            image_url: Set(Some("https://cdn.example.com/old.jpg".to_string())),
            video_url: Set(None),
            caption: Set(None),
            duration: Set(5),
            background_color: Set("#111111".to_string()),
            created_at: Set(old_created.into()),
            expires_at: Set(story::Model::expiry_for(old_created.into())),
        })
        .await
        .unwrap();

    let now = Utc::now();
    let fresh = stories
        .create(story::ActiveModel {
            id: Set(ids.generate()),
            author_id: Set(bob.id.clone()),
            image_url: Set(None),
            video_url: Set(None),
            caption: Set(Some("hi".to_string())),
            duration: Set(5),
            background_color: Set("#111111".to_string()),
            created_at: Set(now.into()),
            expires_at: Set(story::Model::expiry_for(now.into())),
        })
        .await
        .unwrap();

    let active = stories
        .find_active_by_authors(&[bob.id.clone()], Utc::now().into())
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, fresh.id);
    assert!(stories.find_by_id(&expired.id).await.unwrap().is_some());

    let view = || story_view::ActiveModel {
        id: Set(ids.generate()),
        story_id: Set(fresh.id.clone()),
        viewer_id: Set(carol.id.clone()),
        viewed_at: Set(Utc::now().into()),
    };
    stories.create_view(view()).await.unwrap();
    assert!(matches!(
        stories.create_view(view()).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(stories.count_views(&fresh.id).await.unwrap(), 1);
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
