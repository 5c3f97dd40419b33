//! Video service: uploads, listings, likes and threaded comments.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use universe_common::{AppError, AppResult, IdGenerator};
use universe_db::{
    entities::{
        notification::NotificationKind,
        video::{self, VideoCategory},
        video_comment, video_like,
    },
    repositories::VideoRepository,
};
use validator::Validate;

use crate::services::directory::{UserDirectory, UserSummary, summary_or_unknown};
use crate::services::notification::NotificationService;
use crate::services::post::LikeToggle;

/// Maximum number of videos in a listing.
const LISTING_LIMIT: u64 = 100;

/// Trending covers uploads from this many days back.
const TRENDING_WINDOW_DAYS: i64 = 7;

const TRENDING_LIMIT: u64 = 10;

const RELATED_LIMIT: u64 = 5;

const fn default_true() -> bool {
    true
}

/// Input for uploading a video.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadVideoInput {
    #[validate(
        length(min = 1, max = 200),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url)]
    pub video_url: String,

    #[validate(url)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0))]
    pub duration: i32,

    #[serde(default)]
    pub category: VideoCategory,

    #[validate(length(max = 500))]
    pub tags: Option<String>,

    #[serde(default = "default_true")]
    pub is_public: bool,

    #[serde(default = "default_true")]
    pub allow_comments: bool,
}

/// Input for editing a video. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditVideoInput {
    #[validate(
        length(min = 1, max = 200),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url)]
    pub thumbnail_url: Option<String>,

    pub category: Option<VideoCategory>,

    #[validate(length(max = 500))]
    pub tags: Option<String>,

    pub is_public: Option<bool>,

    pub allow_comments: Option<bool>,
}

/// Input for commenting on a video.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoCommentInput {
    #[validate(
        length(min = 1, max = 1000),
        custom(function = "universe_common::validation::validate_not_blank")
    )]
    pub content: String,

    /// Comment being replied to, on the same video.
    pub parent_id: Option<String>,
}

/// A video with its uploader.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    pub video: video::Model,
    pub author: UserSummary,
}

/// The video landing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeed {
    pub videos: Vec<VideoCard>,
    pub trending: Vec<VideoCard>,
}

/// A video comment with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCommentView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// A top-level comment and its replies, both oldest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCommentThread {
    #[serde(flatten)]
    pub comment: VideoCommentView,
    pub replies: Vec<VideoCommentView>,
}

/// Everything the video page needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub video: video::Model,
    pub author: UserSummary,
    pub comments: Vec<VideoCommentThread>,
    pub related: Vec<video::Model>,
    pub like_count: u64,
    pub user_liked: bool,
    pub tags: Vec<String>,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    directory: UserDirectory,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub const fn new(
        video_repo: VideoRepository,
        directory: UserDirectory,
        notifications: NotificationService,
    ) -> Self {
        Self {
            video_repo,
            directory,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Public videos newest first, plus this week's most viewed.
    pub async fn feed(&self) -> AppResult<VideoFeed> {
        let videos = self.video_repo.find_public(LISTING_LIMIT).await?;
        let since = Utc::now().fixed_offset() - Duration::days(TRENDING_WINDOW_DAYS);
        let trending = self.video_repo.find_trending(since, TRENDING_LIMIT).await?;

        let mut author_ids: Vec<String> = videos.iter().map(|v| v.author_id.clone()).collect();
        author_ids.extend(trending.iter().map(|v| v.author_id.clone()));
        let authors = self.directory.summaries(&author_ids).await?;

        Ok(VideoFeed {
            videos: cards(videos, &authors),
            trending: cards(trending, &authors),
        })
    }

    /// Upload a video.
    pub async fn upload(&self, author_id: &str, input: UploadVideoInput) -> AppResult<video::Model> {
        input.validate()?;

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            title: Set(input.title.trim().to_string()),
            description: Set(input.description),
            video_url: Set(input.video_url),
            thumbnail_url: Set(input.thumbnail_url),
            duration: Set(input.duration),
            views: Set(0),
            category: Set(input.category),
            tags: Set(input.tags),
            is_public: Set(input.is_public),
            allow_comments: Set(input.allow_comments),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let video = self.video_repo.create(model).await?;
        tracing::debug!(video = %video.id, author = %author_id, "Video uploaded");
        Ok(video)
    }

    /// Edit a video. Only its author may do so.
    pub async fn edit(
        &self,
        user_id: &str,
        video_id: &str,
        input: EditVideoInput,
    ) -> AppResult<video::Model> {
        input.validate()?;

        let video = self.owned_video(user_id, video_id).await?;
        let mut active: video::ActiveModel = video.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(thumbnail_url) = input.thumbnail_url {
            active.thumbnail_url = Set(Some(thumbnail_url));
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(Some(tags));
        }
        if let Some(is_public) = input.is_public {
            active.is_public = Set(is_public);
        }
        if let Some(allow_comments) = input.allow_comments {
            active.allow_comments = Set(allow_comments);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.video_repo.update(active).await
    }

    /// Delete a video. Only its author may do so.
    pub async fn delete(&self, user_id: &str, video_id: &str) -> AppResult<()> {
        let video = self.owned_video(user_id, video_id).await?;
        self.video_repo.delete(&video.id).await
    }

    /// Open a video page. Views by anyone other than the author are counted.
    pub async fn detail(&self, viewer_id: &str, video_id: &str) -> AppResult<VideoDetail> {
        let mut video = self.video_repo.get_by_id(video_id).await?;
        if !video.is_public && video.author_id != viewer_id {
            return Err(AppError::Forbidden("This video is private".to_string()));
        }

        if video.author_id != viewer_id {
            self.video_repo.increment_views(&video.id).await?;
            video.views += 1;
        }

        let comments = self.video_repo.find_comments(&video.id).await?;
        let related = self.video_repo.find_related(&video, RELATED_LIMIT).await?;
        let like_count = self.video_repo.count_likes(&video.id).await?;
        let user_liked = self.video_repo.find_like(viewer_id, &video.id).await?.is_some();

        let mut user_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        user_ids.push(video.author_id.clone());
        let users = self.directory.summaries(&user_ids).await?;

        Ok(VideoDetail {
            author: summary_or_unknown(&users, &video.author_id),
            comments: thread_comments(comments, &users),
            tags: video.tag_list(),
            related,
            like_count,
            user_liked,
            video,
        })
    }

    /// Public videos in a category, newest first.
    pub async fn by_category(&self, category: VideoCategory) -> AppResult<Vec<VideoCard>> {
        let videos = self
            .video_repo
            .find_by_category(category, LISTING_LIMIT)
            .await?;
        self.with_authors(videos).await
    }

    /// Search public videos by title, description or tags.
    pub async fn search(&self, query: &str) -> AppResult<Vec<VideoCard>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }
        let videos = self.video_repo.search(query, LISTING_LIMIT).await?;
        self.with_authors(videos).await
    }

    /// Videos uploaded by `author_id`, newest first.
    pub async fn by_author(&self, author_id: &str) -> AppResult<Vec<video::Model>> {
        self.video_repo.find_by_author(author_id).await
    }

    /// Like a video, or remove the like if it exists.
    pub async fn toggle_like(&self, user_id: &str, video_id: &str) -> AppResult<LikeToggle> {
        let video = self.video_repo.get_by_id(video_id).await?;

        let liked = if self.video_repo.delete_like(user_id, &video.id).await? {
            false
        } else {
            let model = video_like::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                video_id: Set(video.id.clone()),
                created_at: Set(Utc::now().into()),
            };
            match self.video_repo.create_like(model).await {
                Ok(_) => {
                    self.notifications
                        .notify_quietly(&video.author_id, user_id, NotificationKind::Like, None)
                        .await;
                }
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e),
            }
            true
        };

        let like_count = self.video_repo.count_likes(&video.id).await?;
        Ok(LikeToggle { liked, like_count })
    }

    /// Comment on a video, optionally as a reply.
    pub async fn add_comment(
        &self,
        author_id: &str,
        video_id: &str,
        input: VideoCommentInput,
    ) -> AppResult<VideoCommentView> {
        input.validate()?;

        let video = self.video_repo.get_by_id(video_id).await?;
        if !video.allow_comments {
            return Err(AppError::Forbidden(
                "Comments are disabled for this video".to_string(),
            ));
        }

        if let Some(parent_id) = &input.parent_id {
            let parent = self
                .video_repo
                .find_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Comment {parent_id}")))?;
            if parent.video_id != video.id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to another video".to_string(),
                ));
            }
        }

        let model = video_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            video_id: Set(video.id.clone()),
            author_id: Set(author_id.to_string()),
            parent_id: Set(input.parent_id),
            content: Set(input.content.trim().to_string()),
            created_at: Set(Utc::now().into()),
        };
        let comment = self.video_repo.create_comment(model).await?;

        self.notifications
            .notify_quietly(&video.author_id, author_id, NotificationKind::Comment, None)
            .await;

        let authors = self.directory.summaries(std::slice::from_ref(&comment.author_id)).await?;
        Ok(comment_view(comment, &authors))
    }

    async fn owned_video(&self, user_id: &str, video_id: &str) -> AppResult<video::Model> {
        let video = self.video_repo.get_by_id(video_id).await?;
        if video.author_id != user_id {
            return Err(AppError::Forbidden(
                "You can only modify your own videos".to_string(),
            ));
        }
        Ok(video)
    }

    async fn with_authors(&self, videos: Vec<video::Model>) -> AppResult<Vec<VideoCard>> {
        let author_ids: Vec<String> = videos.iter().map(|v| v.author_id.clone()).collect();
        let authors = self.directory.summaries(&author_ids).await?;
        Ok(cards(videos, &authors))
    }
}

fn cards(videos: Vec<video::Model>, authors: &HashMap<String, UserSummary>) -> Vec<VideoCard> {
    videos
        .into_iter()
        .map(|video| VideoCard {
            author: summary_or_unknown(authors, &video.author_id),
            video,
        })
        .collect()
}

fn comment_view(
    comment: video_comment::Model,
    authors: &HashMap<String, UserSummary>,
) -> VideoCommentView {
    VideoCommentView {
        author: summary_or_unknown(authors, &comment.author_id),
        id: comment.id,
        content: comment.content,
        parent_id: comment.parent_id,
        created_at: comment.created_at,
    }
}

/// Nest replies under their top-level comment. Input is oldest first.
///
/// Replies to replies are attached to the top-level comment they descend from.
fn thread_comments(
    comments: Vec<video_comment::Model>,
    authors: &HashMap<String, UserSummary>,
) -> Vec<VideoCommentThread> {
    let parents: HashMap<String, Option<String>> = comments
        .iter()
        .map(|c| (c.id.clone(), c.parent_id.clone()))
        .collect();

    let root_of = |id: &str| -> Option<String> {
        let mut current = id.to_string();
        // Bounded by the number of comments, which also guards against cycles.
        for _ in 0..=parents.len() {
            match parents.get(&current) {
                Some(Some(parent)) => current = parent.clone(),
                Some(None) => return Some(current),
                None => return None,
            }
        }
        None
    };

    let mut threads: Vec<VideoCommentThread> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut replies: Vec<(String, VideoCommentView)> = Vec::new();

    for c in comments {
        if c.parent_id.is_none() {
            index.insert(c.id.clone(), threads.len());
            threads.push(VideoCommentThread {
                comment: comment_view(c, authors),
                replies: Vec::new(),
            });
        } else if let Some(root) = root_of(&c.id) {
            replies.push((root, comment_view(c, authors)));
        }
    }

    for (root, reply) in replies {
        if let Some(&i) = index.get(&root) {
            threads[i].replies.push(reply);
        }
    }

    threads
}
