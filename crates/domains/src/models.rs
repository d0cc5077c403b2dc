//! # Domain Models
//!
//! These structs represent the core entities of the social graph and its content.
//! Identifiers are store-assigned monotonic integers; comment ids double as
//! pagination cursors, so ordering by id is ordering by creation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

id_type!(
    UserId,
    CircleId,
    CommunityId,
    PostId,
    /// Monotonic; used as the cursor for comment pagination.
    CommentId,
    ReactionId,
    EmojiId,
    EmojiGroupId,
    NotificationId,
    LogId,
);

// ── Users & relationships ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Implicit circle every confirmed connection lands in by default.
    pub connections_circle_id: CircleId,
    pub created_at: DateTime<Utc>,
}

/// A named grouping of a user's connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
    pub id: CircleId,
    pub owner: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Pending,
    Confirmed,
}

/// One direction of a connection: the circles `owner` placed `target` in.
///
/// A confirmed relationship is stored as two rows, one per side, each carrying
/// the circles that side granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub owner: UserId,
    pub target: UserId,
    pub circles: BTreeSet<CircleId>,
    pub status: ConnectionStatus,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn is_confirmed(&self) -> bool {
        self.status == ConnectionStatus::Confirmed
    }
}

// ── Communities ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommunityType {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub kind: CommunityType,
    /// Implicitly an administrator.
    pub creator: UserId,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn is_private(&self) -> bool {
        self.kind == CommunityType::Private
    }
}

/// Staff role within a community.
///
/// Ordered so that `Administrator > Moderator > None`; no moderation action
/// distinguishes the two staff roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[default]
    None,
    Moderator,
    Administrator,
}

impl StaffRole {
    pub fn is_staff(self) -> bool {
        self != StaffRole::None
    }
}

/// Moderation log action codes, serialized as the short codes clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogAction {
    #[serde(rename = "RP")]
    RemovePost,
    #[serde(rename = "RPC")]
    RemovePostComment,
    #[serde(rename = "EPC")]
    EnablePostComments,
    #[serde(rename = "DPC")]
    DisablePostComments,
    #[serde(rename = "CP")]
    ClosePost,
    #[serde(rename = "OP")]
    OpenPost,
    #[serde(rename = "B")]
    Ban,
    #[serde(rename = "U")]
    Unban,
    #[serde(rename = "AA")]
    AddAdministrator,
    #[serde(rename = "RA")]
    RemoveAdministrator,
    #[serde(rename = "AM")]
    AddModerator,
    #[serde(rename = "RM")]
    RemoveModerator,
}

impl LogAction {
    pub fn code(self) -> &'static str {
        match self {
            LogAction::RemovePost => "RP",
            LogAction::RemovePostComment => "RPC",
            LogAction::EnablePostComments => "EPC",
            LogAction::DisablePostComments => "DPC",
            LogAction::ClosePost => "CP",
            LogAction::OpenPost => "OP",
            LogAction::Ban => "B",
            LogAction::Unban => "U",
            LogAction::AddAdministrator => "AA",
            LogAction::RemoveAdministrator => "RA",
            LogAction::AddModerator => "AM",
            LogAction::RemoveModerator => "RM",
        }
    }
}

/// A moderation log entry before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub community: CommunityId,
    pub action: LogAction,
    pub source_user: UserId,
    pub target_user: UserId,
    pub post: Option<PostId>,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a staff action inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationLog {
    pub id: LogId,
    pub community: CommunityId,
    pub action: LogAction,
    pub source_user: UserId,
    pub target_user: UserId,
    pub post: Option<PostId>,
    pub created_at: DateTime<Utc>,
}

// ── Posts ───────────────────────────────────────────────────────────────────

/// Who a post is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PostAudience {
    Public,
    Encircled { circles: BTreeSet<CircleId> },
    Community { community: CommunityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// Reference to a file handled by the MediaStorage port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMedia {
    pub kind: MediaKind,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub creator: UserId,
    pub text: Option<String>,
    pub media: Option<PostMedia>,
    pub audience: PostAudience,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Public handle used by clients instead of the sequential id.
    pub uuid: Uuid,
    pub creator: UserId,
    pub text: Option<String>,
    pub media: Option<PostMedia>,
    pub audience: PostAudience,
    pub is_closed: bool,
    pub comments_enabled: bool,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn community(&self) -> Option<CommunityId> {
        match self.audience {
            PostAudience::Community { community } => Some(community),
            _ => None,
        }
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// A single moderation flag change, applied to the stored row as it is at
/// write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFlag {
    CommentsEnabled(bool),
    Closed(bool),
}

impl PostFlag {
    pub fn apply(self, post: &mut Post) {
        match self {
            PostFlag::CommentsEnabled(enabled) => post.comments_enabled = enabled,
            PostFlag::Closed(closed) => post.is_closed = closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub post: PostId,
    pub commenter: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    pub id: CommentId,
    pub post: PostId,
    pub commenter: UserId,
    pub text: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReaction {
    pub post: PostId,
    pub reactor: UserId,
    pub emoji: EmojiId,
    pub created_at: DateTime<Utc>,
}

/// Unique per (post, reactor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReaction {
    pub id: ReactionId,
    pub post: PostId,
    pub reactor: UserId,
    pub emoji: EmojiId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiGroup {
    pub id: EmojiGroupId,
    pub keyword: String,
    pub is_reaction_group: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub id: EmojiId,
    pub group: EmojiGroupId,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiCount {
    pub emoji: EmojiId,
    pub count: u64,
}

// ── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    PostComment { post: PostId, comment: CommentId },
    PostReaction { post: PostId, reaction: ReactionId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    /// The user being notified.
    pub owner: UserId,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// ── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Ascending,
    #[default]
    #[serde(rename = "DESC")]
    Descending,
}

/// Cursor parameters for listing a post's comments.
///
/// `max_id` selects ids strictly below it, `min_id` ids at or above it; each
/// side is capped by its own count. With neither cursor the newest comments
/// are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentsQuery {
    pub max_id: Option<CommentId>,
    pub min_id: Option<CommentId>,
    pub count_max: Option<usize>,
    pub count_min: Option<usize>,
    #[serde(default)]
    pub sort: SortOrder,
}
