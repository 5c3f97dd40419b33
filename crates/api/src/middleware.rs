//! API middleware and shared state.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use sea_orm::DatabaseConnection;
use universe_core::{
    AccountService, AiService, FollowingService, GroupPostService, GroupService,
    HighlightService, MessagingService, NotificationService, PlaylistService, PostService,
    ProfileService, StoryService, TimelineService, UserDirectory, VideoService,
};
use universe_db::repositories::{
    CommentRepository, FollowingRepository, GroupPostRepository, GroupRepository,
    HighlightRepository, MessageRepository, NotificationRepository, PlaylistRepository,
    PostLikeRepository, PostRepository, ProfileRepository, StoryRepository, UserRepository,
    VideoRepository,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub directory: UserDirectory,
    pub account_service: AccountService,
    pub profile_service: ProfileService,
    pub following_service: FollowingService,
    pub post_service: PostService,
    pub timeline_service: TimelineService,
    pub notification_service: NotificationService,
    pub messaging_service: MessagingService,
    pub story_service: StoryService,
    pub highlight_service: HighlightService,
    pub video_service: VideoService,
    pub playlist_service: PlaylistService,
    pub group_service: GroupService,
    pub group_post_service: GroupPostService,
    /// `None` when the AI helpers are disabled.
    pub ai_service: Option<AiService>,
}

impl AppState {
    /// Wire every repository and service over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, ai_service: Option<AiService>) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = ProfileRepository::new(Arc::clone(&db));
        let following_repo = FollowingRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let post_like_repo = PostLikeRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let notification_repo = NotificationRepository::new(Arc::clone(&db));
        let message_repo = MessageRepository::new(Arc::clone(&db));
        let story_repo = StoryRepository::new(Arc::clone(&db));
        let highlight_repo = HighlightRepository::new(Arc::clone(&db));
        let video_repo = VideoRepository::new(Arc::clone(&db));
        let playlist_repo = PlaylistRepository::new(Arc::clone(&db));
        let group_repo = GroupRepository::new(Arc::clone(&db));
        let group_post_repo = GroupPostRepository::new(db);

        let directory = UserDirectory::new(user_repo.clone(), profile_repo.clone());
        let notification_service =
            NotificationService::new(notification_repo.clone(), directory.clone());

        let post_service = PostService::new(
            post_repo.clone(),
            post_like_repo,
            comment_repo,
            directory.clone(),
            notification_service.clone(),
        );
        let story_service = StoryService::new(
            story_repo.clone(),
            following_repo.clone(),
            user_repo.clone(),
            directory.clone(),
        );
        let group_post_service =
            GroupPostService::new(group_repo.clone(), group_post_repo, directory.clone());

        Self {
            account_service: AccountService::new(user_repo.clone(), profile_repo.clone()),
            profile_service: ProfileService::new(
                user_repo.clone(),
                profile_repo,
                following_repo.clone(),
                post_repo.clone(),
                message_repo.clone(),
                notification_repo,
                directory.clone(),
                post_service.clone(),
            ),
            following_service: FollowingService::new(
                following_repo.clone(),
                user_repo.clone(),
                directory.clone(),
                notification_service.clone(),
            ),
            timeline_service: TimelineService::new(
                post_repo,
                following_repo,
                user_repo.clone(),
                directory.clone(),
                post_service.clone(),
                story_service.clone(),
            ),
            messaging_service: MessagingService::new(
                message_repo,
                user_repo.clone(),
                directory.clone(),
                notification_service.clone(),
            ),
            highlight_service: HighlightService::new(highlight_repo, story_repo, user_repo),
            video_service: VideoService::new(
                video_repo.clone(),
                directory.clone(),
                notification_service.clone(),
            ),
            playlist_service: PlaylistService::new(playlist_repo, video_repo),
            group_service: GroupService::new(
                group_repo,
                directory.clone(),
                group_post_service.clone(),
            ),
            group_post_service,
            post_service,
            story_service,
            notification_service,
            directory,
            ai_service,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unknown tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.account_service.authenticate_by_token(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
