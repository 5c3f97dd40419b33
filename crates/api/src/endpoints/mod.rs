//! API endpoints.

mod ai;
mod auth;
mod following;
mod group_posts;
mod groups;
mod highlights;
mod messaging;
mod notifications;
mod playlists;
mod posts;
mod stories;
mod timeline;
mod users;
mod videos;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/timeline", timeline::router())
        .nest("/users", users::router())
        .nest("/follow", following::router())
        .nest("/posts", posts::router())
        .nest("/notifications", notifications::router())
        .nest("/messages", messaging::router())
        .nest("/stories", stories::router())
        .nest("/highlights", highlights::router())
        .nest("/videos", videos::router())
        .nest("/playlists", playlists::router())
        .nest("/groups", groups::router())
        .nest("/group-posts", group_posts::router())
        .nest("/ai", ai::router())
}
