//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod following;
pub mod group;
pub mod group_membership;
pub mod group_post;
pub mod group_post_comment;
pub mod group_post_like;
pub mod message;
pub mod notification;
pub mod playlist;
pub mod playlist_video;
pub mod post;
pub mod post_like;
pub mod profile;
pub mod story;
pub mod story_highlight;
pub mod story_highlight_item;
pub mod story_view;
pub mod user;
pub mod video;
pub mod video_comment;
pub mod video_like;

pub use comment::Entity as Comment;
pub use following::Entity as Following;
pub use group::Entity as Group;
pub use group_membership::Entity as GroupMembership;
pub use group_post::Entity as GroupPost;
pub use group_post_comment::Entity as GroupPostComment;
pub use group_post_like::Entity as GroupPostLike;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use playlist::Entity as Playlist;
pub use playlist_video::Entity as PlaylistVideo;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use profile::Entity as Profile;
pub use story::Entity as Story;
pub use story_highlight::Entity as StoryHighlight;
pub use story_highlight_item::Entity as StoryHighlightItem;
pub use story_view::Entity as StoryView;
pub use user::Entity as User;
pub use video::Entity as Video;
pub use video_comment::Entity as VideoComment;
pub use video_like::Entity as VideoLike;
