//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod ai;
pub mod directory;
pub mod following;
pub mod group;
pub mod group_post;
pub mod highlight;
pub mod messaging;
pub mod notification;
pub mod playlist;
pub mod post;
pub mod profile;
pub mod story;
pub mod timeline;
pub mod video;

pub use account::{AccountService, RegisterInput, SignInInput};
pub use ai::{
    AiProvider, AiService, HttpAiProvider, LocalAiProvider, Sentiment, Suggestions, Toxicity,
    Translation,
};
pub use directory::{UserDirectory, UserSummary};
pub use following::{FollowResult, FollowingService};
pub use group::{
    CreateGroupInput, EditGroupInput, GroupDetail, GroupListing, GroupService, GroupSummary,
    MemberView,
};
pub use group_post::{
    CreateGroupPostInput, GroupCommentInput, GroupCommentView, GroupPostService, GroupPostView,
};
pub use highlight::{CreateHighlightInput, HighlightDetail, HighlightService};
pub use messaging::{ConversationSummary, MessagingService, SendMessageInput, Thread};
pub use notification::{NotificationService, NotificationView};
pub use playlist::{
    CreatePlaylistInput, EditPlaylistInput, PlaylistAddResult, PlaylistDetail, PlaylistOverview,
    PlaylistService,
};
pub use post::{
    AddedComment, CommentAdded, CommentInput, CommentView, CreatePostInput, LikeToggle, PostService,
    PostView,
};
pub use profile::{ProfileService, ProfileView, UnreadCounts, UpdateProfileInput};
pub use story::{CreateStoryInput, StoryService, StoryUser, StoryViewing};
pub use timeline::{Timeline, TimelineService};
pub use video::{
    EditVideoInput, UploadVideoInput, VideoCard, VideoCommentInput, VideoCommentThread,
    VideoCommentView, VideoDetail, VideoFeed, VideoService,
};
