//! # In-memory store
//!
//! Backs every repository port with plain collections behind one
//! `tokio::sync::RwLock`. Each port call takes the lock once, so the
//! composite writes (comment + notifications, moderation + log entry,
//! post deletion + cascade) are all-or-nothing for concurrent callers.
//!
//! Identifiers come from a single monotonic counter, which keeps comment
//! ids increasing in creation order as cursor pagination expects.

mod community;
mod content;
mod graph;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use domains::{
    Circle, CircleId, CommentId, Community, CommunityId, Connection, DomainError, Emoji, EmojiGroup,
    EmojiGroupId, EmojiId, LogId, ModerationLog, NewLogEntry, Notification, NotificationId,
    NotificationKind, Post, PostComment, PostId, PostReaction, ReactionId, Result, StaffRole, User,
    UserId,
};
use tokio::sync::RwLock;

#[derive(Default)]
pub(crate) struct Tables {
    sequence: u64,

    users: BTreeMap<UserId, User>,
    circles: BTreeMap<CircleId, Circle>,
    /// Keyed by (owner, target).
    connections: HashMap<(UserId, UserId), Connection>,
    /// (follower, followed)
    follows: HashSet<(UserId, UserId)>,
    /// (blocker, blocked)
    blocks: HashSet<(UserId, UserId)>,

    communities: BTreeMap<CommunityId, Community>,
    members: HashSet<(CommunityId, UserId)>,
    roles: HashMap<(CommunityId, UserId), StaffRole>,
    bans: HashSet<(CommunityId, UserId)>,
    invites: HashMap<(CommunityId, UserId), UserId>,
    logs: Vec<ModerationLog>,

    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, PostComment>,
    reactions: BTreeMap<ReactionId, PostReaction>,
    /// (post, user)
    mutes: BTreeSet<(PostId, UserId)>,

    emoji_groups: BTreeMap<EmojiGroupId, EmojiGroup>,
    emojis: BTreeMap<EmojiId, Emoji>,

    notifications: BTreeMap<NotificationId, Notification>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Rejects a log entry whose community is gone before anything is written.
    fn check_log(&self, log: Option<&NewLogEntry>) -> Result<()> {
        match log {
            Some(entry) if !self.communities.contains_key(&entry.community) => Err(DomainError::Internal(
                format!("cannot log to missing community {}", entry.community),
            )),
            _ => Ok(()),
        }
    }

    fn append_log(&mut self, entry: NewLogEntry) {
        let id = LogId(self.next_id());
        self.logs.push(ModerationLog {
            id,
            community: entry.community,
            action: entry.action,
            source_user: entry.source_user,
            target_user: entry.target_user,
            post: entry.post,
            created_at: entry.created_at,
        });
    }

    fn notify(&mut self, owner: UserId, kind: NotificationKind, created_at: DateTime<Utc>) {
        let id = NotificationId(self.next_id());
        self.notifications.insert(id, Notification { id, owner, kind, read: false, created_at });
    }

    /// Drops every notification about `post` that matches `also`.
    fn drop_notifications(&mut self, post: PostId, also: impl Fn(&NotificationKind) -> bool) {
        self.notifications.retain(|_, n| {
            let on_post = match n.kind {
                NotificationKind::PostComment { post: p, .. } | NotificationKind::PostReaction { post: p, .. } => {
                    p == post
                }
            };
            !(on_post && also(&n.kind))
        });
    }
}

/// Process-local store implementing every repository port.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
