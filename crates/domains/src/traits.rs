//! # Core Traits (Ports)
//!
//! Any storage adapter must implement these traits to back the services.
//! Composite writes (content mutation + notification fan-out + moderation log)
//! are single port calls so an adapter can commit them all-or-nothing.

use std::collections::BTreeSet;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::models::*;

/// User accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Creates the user together with their connections circle.
    async fn create_user(&self, username: &str) -> Result<User>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Circles, connections, follows and blocks.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GraphRepo: Send + Sync {
    async fn create_circle(&self, owner: UserId, name: &str) -> Result<Circle>;
    async fn get_circle(&self, id: CircleId) -> Result<Option<Circle>>;

    /// The row describing what `owner` granted `target`, if any.
    async fn get_connection(&self, owner: UserId, target: UserId) -> Result<Option<Connection>>;
    async fn insert_connection(&self, connection: Connection) -> Result<()>;
    /// Marks the requester's pending row confirmed and inserts the confirmer's
    /// row with the given circles, atomically.
    async fn confirm_connection(
        &self,
        confirmer: UserId,
        requester: UserId,
        circles: BTreeSet<CircleId>,
    ) -> Result<()>;
    async fn update_connection_circles(
        &self,
        owner: UserId,
        target: UserId,
        circles: BTreeSet<CircleId>,
    ) -> Result<()>;
    /// Removes both directions.
    async fn delete_connection(&self, a: UserId, b: UserId) -> Result<()>;

    async fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool>;
    async fn insert_follow(&self, follower: UserId, followed: UserId) -> Result<()>;
    async fn delete_follow(&self, follower: UserId, followed: UserId) -> Result<()>;

    /// Directional: did `blocker` block `blocked`.
    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool>;
    /// Inserts the block and drops connections and follows in both directions.
    async fn insert_block(&self, blocker: UserId, blocked: UserId) -> Result<()>;
    async fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<()>;
}

/// Communities, memberships, roles, bans, invites and the moderation log.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommunityRepo: Send + Sync {
    /// Creates the community with its creator as the first member.
    async fn create_community(&self, name: &str, kind: CommunityType, creator: UserId) -> Result<Community>;
    async fn get_community(&self, id: CommunityId) -> Result<Option<Community>>;
    async fn find_community_by_name(&self, name: &str) -> Result<Option<Community>>;

    async fn is_member(&self, user: UserId, community: CommunityId) -> Result<bool>;
    async fn add_member(&self, user: UserId, community: CommunityId) -> Result<()>;
    async fn remove_member(&self, user: UserId, community: CommunityId) -> Result<()>;

    /// The stored role only; creator precedence is applied by the registry.
    async fn stored_role(&self, user: UserId, community: CommunityId) -> Result<StaffRole>;
    async fn set_role(&self, user: UserId, community: CommunityId, role: StaffRole, log: NewLogEntry) -> Result<()>;

    async fn is_banned(&self, user: UserId, community: CommunityId) -> Result<bool>;
    /// Records the ban, drops membership and role, and appends the log entry.
    async fn ban(&self, user: UserId, community: CommunityId, log: NewLogEntry) -> Result<()>;
    async fn unban(&self, user: UserId, community: CommunityId, log: NewLogEntry) -> Result<()>;

    async fn insert_invite(&self, inviter: UserId, invitee: UserId, community: CommunityId) -> Result<()>;
    async fn has_invite(&self, invitee: UserId, community: CommunityId) -> Result<bool>;

    /// Newest first.
    async fn list_logs(&self, community: CommunityId) -> Result<Vec<ModerationLog>>;
}

/// Posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post>;
    async fn get_post(&self, id: PostId) -> Result<Option<Post>>;
    async fn find_post_by_uuid(&self, uuid: uuid::Uuid) -> Result<Option<Post>>;
    /// Replaces the text and marks the post edited. Returns the updated row.
    async fn set_post_text(&self, id: PostId, text: Option<String>) -> Result<Post>;
    /// Applies `flag` to the current row and appends `log` in the same write.
    /// Returns the updated row.
    async fn set_post_flag(&self, id: PostId, flag: PostFlag, log: Option<NewLogEntry>) -> Result<Post>;
    /// Deletes the post and cascades comments, reactions, mutes and
    /// notifications. Returns the removed post.
    async fn delete_post(&self, id: PostId, log: Option<NewLogEntry>) -> Result<Option<Post>>;
}

/// Comments, reactions and per-post mutes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn get_comment(&self, id: CommentId) -> Result<Option<PostComment>>;
    /// All comments of a post, ascending by id.
    async fn list_comments(&self, post: PostId) -> Result<Vec<PostComment>>;
    /// Distinct commenters of a post.
    async fn commenters(&self, post: PostId) -> Result<BTreeSet<UserId>>;
    /// Inserts the comment and one notification per `notify` entry.
    async fn insert_comment(&self, comment: NewComment, notify: Vec<UserId>) -> Result<PostComment>;
    /// Replaces the text and marks the comment edited. Returns the updated row.
    async fn set_comment_text(&self, id: CommentId, text: String) -> Result<PostComment>;
    /// Deletes the comment and its notifications; appends `log` when given.
    async fn delete_comment(&self, id: CommentId, log: Option<NewLogEntry>) -> Result<bool>;

    async fn get_reaction(&self, id: ReactionId) -> Result<Option<PostReaction>>;
    async fn list_reactions(&self, post: PostId) -> Result<Vec<PostReaction>>;
    /// Upsert on (post, reactor): an existing row keeps its id and creation
    /// time and takes the new emoji. Its notifications are replaced by one
    /// for `notify`.
    async fn upsert_reaction(&self, reaction: NewReaction, notify: Option<UserId>) -> Result<PostReaction>;
    async fn delete_reaction(&self, id: ReactionId) -> Result<bool>;

    async fn is_muted(&self, user: UserId, post: PostId) -> Result<bool>;
    async fn insert_mute(&self, user: UserId, post: PostId) -> Result<()>;
    async fn delete_mute(&self, user: UserId, post: PostId) -> Result<()>;
    async fn muters(&self, post: PostId) -> Result<BTreeSet<UserId>>;
}

/// Emoji catalogue.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EmojiRepo: Send + Sync {
    async fn create_emoji_group(&self, keyword: &str, is_reaction_group: bool) -> Result<EmojiGroup>;
    async fn create_emoji(&self, group: EmojiGroupId, keyword: &str) -> Result<Emoji>;
    async fn get_emoji(&self, id: EmojiId) -> Result<Option<Emoji>>;
    async fn get_emoji_group(&self, id: EmojiGroupId) -> Result<Option<EmojiGroup>>;
    async fn list_emoji_groups(&self) -> Result<Vec<EmojiGroup>>;
}

/// Stored notifications.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    /// Newest first.
    async fn list_notifications(&self, owner: UserId) -> Result<Vec<Notification>>;
    async fn get_notification(&self, id: NotificationId) -> Result<Option<Notification>>;
    async fn mark_read(&self, id: NotificationId) -> Result<()>;
    async fn delete_notification(&self, id: NotificationId) -> Result<bool>;
}

/// Binary storage for post images and videos.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Saves raw bytes and returns the reference stored on the post.
    async fn store(&self, data: Bytes, content_type: &mime::Mime) -> Result<String>;
    /// Removes the file behind `reference`; unknown references are not an error.
    async fn delete(&self, reference: &str) -> Result<()>;
}
