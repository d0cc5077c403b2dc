use std::collections::BTreeSet;

use async_trait::async_trait;
use domains::{
    CommentId, DomainError, Emoji, EmojiGroup, EmojiGroupId, EmojiId, EmojiRepo, InteractionRepo,
    NewComment, NewLogEntry, NewPost, NewReaction, Notification, NotificationId, NotificationKind,
    NotificationRepo, Post, PostComment, PostFlag, PostId, PostReaction, PostRepo, ReactionId,
    Result, UserId,
};
use uuid::Uuid;

use super::InMemoryStore;

#[async_trait]
impl PostRepo for InMemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post> {
        let mut t = self.tables.write().await;
        let id = PostId(t.next_id());
        let post = Post {
            id,
            uuid: Uuid::new_v4(),
            creator: post.creator,
            text: post.text,
            media: post.media,
            audience: post.audience,
            is_closed: false,
            comments_enabled: true,
            is_edited: false,
            created_at: post.created_at,
        };
        t.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn find_post_by_uuid(&self, uuid: Uuid) -> Result<Option<Post>> {
        let t = self.tables.read().await;
        Ok(t.posts.values().find(|p| p.uuid == uuid).cloned())
    }

    async fn set_post_text(&self, id: PostId, text: Option<String>) -> Result<Post> {
        let mut t = self.tables.write().await;
        let stored = t.posts.get_mut(&id).ok_or_else(|| DomainError::not_found("Post", id))?;
        stored.text = text;
        stored.is_edited = true;
        Ok(stored.clone())
    }

    async fn set_post_flag(&self, id: PostId, flag: PostFlag, log: Option<NewLogEntry>) -> Result<Post> {
        let mut t = self.tables.write().await;
        t.check_log(log.as_ref())?;
        let stored = t.posts.get_mut(&id).ok_or_else(|| DomainError::not_found("Post", id))?;
        flag.apply(stored);
        let updated = stored.clone();
        if let Some(log) = log {
            t.append_log(log);
        }
        Ok(updated)
    }

    async fn delete_post(&self, id: PostId, log: Option<NewLogEntry>) -> Result<Option<Post>> {
        let mut t = self.tables.write().await;
        t.check_log(log.as_ref())?;
        let Some(post) = t.posts.remove(&id) else {
            return Ok(None);
        };
        t.comments.retain(|_, c| c.post != id);
        t.reactions.retain(|_, r| r.post != id);
        t.mutes.retain(|(post, _)| *post != id);
        t.drop_notifications(id, |_| true);
        if let Some(log) = log {
            t.append_log(log);
        }
        Ok(Some(post))
    }
}

#[async_trait]
impl InteractionRepo for InMemoryStore {
    async fn get_comment(&self, id: CommentId) -> Result<Option<PostComment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn list_comments(&self, post: PostId) -> Result<Vec<PostComment>> {
        let t = self.tables.read().await;
        Ok(t.comments.values().filter(|c| c.post == post).cloned().collect())
    }

    async fn commenters(&self, post: PostId) -> Result<BTreeSet<UserId>> {
        let t = self.tables.read().await;
        Ok(t.comments
            .values()
            .filter(|c| c.post == post)
            .map(|c| c.commenter)
            .collect())
    }

    async fn insert_comment(&self, comment: NewComment, notify: Vec<UserId>) -> Result<PostComment> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&comment.post) {
            return Err(DomainError::not_found("Post", comment.post));
        }
        let id = CommentId(t.next_id());
        let comment = PostComment {
            id,
            post: comment.post,
            commenter: comment.commenter,
            text: comment.text,
            is_edited: false,
            created_at: comment.created_at,
        };
        t.comments.insert(id, comment.clone());
        for owner in notify {
            t.notify(
                owner,
                NotificationKind::PostComment { post: comment.post, comment: id },
                comment.created_at,
            );
        }
        Ok(comment)
    }

    async fn set_comment_text(&self, id: CommentId, text: String) -> Result<PostComment> {
        let mut t = self.tables.write().await;
        let stored = t
            .comments
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("PostComment", id))?;
        stored.text = text;
        stored.is_edited = true;
        Ok(stored.clone())
    }

    async fn delete_comment(&self, id: CommentId, log: Option<NewLogEntry>) -> Result<bool> {
        let mut t = self.tables.write().await;
        t.check_log(log.as_ref())?;
        let Some(comment) = t.comments.remove(&id) else {
            return Ok(false);
        };
        t.drop_notifications(comment.post, |kind| {
            matches!(kind, NotificationKind::PostComment { comment, .. } if *comment == id)
        });
        if let Some(log) = log {
            t.append_log(log);
        }
        Ok(true)
    }

    async fn get_reaction(&self, id: ReactionId) -> Result<Option<PostReaction>> {
        Ok(self.tables.read().await.reactions.get(&id).cloned())
    }

    async fn list_reactions(&self, post: PostId) -> Result<Vec<PostReaction>> {
        let t = self.tables.read().await;
        Ok(t.reactions.values().filter(|r| r.post == post).cloned().collect())
    }

    async fn upsert_reaction(&self, reaction: NewReaction, notify: Option<UserId>) -> Result<PostReaction> {
        let mut t = self.tables.write().await;
        if !t.posts.contains_key(&reaction.post) {
            return Err(DomainError::not_found("Post", reaction.post));
        }
        let existing = t
            .reactions
            .values()
            .find(|r| r.post == reaction.post && r.reactor == reaction.reactor)
            .map(|r| (r.id, r.created_at));

        // A replaced reaction keeps its row: same id, original timestamp.
        let (id, created_at) = match existing {
            Some((id, created_at)) => {
                t.drop_notifications(reaction.post, |kind| {
                    matches!(kind, NotificationKind::PostReaction { reaction, .. } if *reaction == id)
                });
                (id, created_at)
            }
            None => (ReactionId(t.next_id()), reaction.created_at),
        };
        let stored = PostReaction {
            id,
            post: reaction.post,
            reactor: reaction.reactor,
            emoji: reaction.emoji,
            created_at,
        };
        t.reactions.insert(id, stored.clone());
        if let Some(owner) = notify {
            t.notify(
                owner,
                NotificationKind::PostReaction { post: stored.post, reaction: id },
                reaction.created_at,
            );
        }
        Ok(stored)
    }

    async fn delete_reaction(&self, id: ReactionId) -> Result<bool> {
        let mut t = self.tables.write().await;
        let Some(reaction) = t.reactions.remove(&id) else {
            return Ok(false);
        };
        t.drop_notifications(reaction.post, |kind| {
            matches!(kind, NotificationKind::PostReaction { reaction, .. } if *reaction == id)
        });
        Ok(true)
    }

    async fn is_muted(&self, user: UserId, post: PostId) -> Result<bool> {
        Ok(self.tables.read().await.mutes.contains(&(post, user)))
    }

    async fn insert_mute(&self, user: UserId, post: PostId) -> Result<()> {
        self.tables.write().await.mutes.insert((post, user));
        Ok(())
    }

    async fn delete_mute(&self, user: UserId, post: PostId) -> Result<()> {
        self.tables.write().await.mutes.remove(&(post, user));
        Ok(())
    }

    async fn muters(&self, post: PostId) -> Result<BTreeSet<UserId>> {
        let t = self.tables.read().await;
        Ok(t.mutes
            .range((post, UserId(0))..=(post, UserId(u64::MAX)))
            .map(|(_, user)| *user)
            .collect())
    }
}

#[async_trait]
impl EmojiRepo for InMemoryStore {
    async fn create_emoji_group(&self, keyword: &str, is_reaction_group: bool) -> Result<EmojiGroup> {
        let mut t = self.tables.write().await;
        let id = EmojiGroupId(t.next_id());
        let group = EmojiGroup { id, keyword: keyword.to_string(), is_reaction_group };
        t.emoji_groups.insert(id, group.clone());
        Ok(group)
    }

    async fn create_emoji(&self, group: EmojiGroupId, keyword: &str) -> Result<Emoji> {
        let mut t = self.tables.write().await;
        if !t.emoji_groups.contains_key(&group) {
            return Err(DomainError::not_found("EmojiGroup", group));
        }
        let id = EmojiId(t.next_id());
        let emoji = Emoji { id, group, keyword: keyword.to_string() };
        t.emojis.insert(id, emoji.clone());
        Ok(emoji)
    }

    async fn get_emoji(&self, id: EmojiId) -> Result<Option<Emoji>> {
        Ok(self.tables.read().await.emojis.get(&id).cloned())
    }

    async fn get_emoji_group(&self, id: EmojiGroupId) -> Result<Option<EmojiGroup>> {
        Ok(self.tables.read().await.emoji_groups.get(&id).cloned())
    }

    async fn list_emoji_groups(&self) -> Result<Vec<EmojiGroup>> {
        Ok(self.tables.read().await.emoji_groups.values().cloned().collect())
    }
}

#[async_trait]
impl NotificationRepo for InMemoryStore {
    async fn list_notifications(&self, owner: UserId) -> Result<Vec<Notification>> {
        let t = self.tables.read().await;
        Ok(t.notifications
            .values()
            .rev()
            .filter(|n| n.owner == owner)
            .cloned()
            .collect())
    }

    async fn get_notification(&self, id: NotificationId) -> Result<Option<Notification>> {
        Ok(self.tables.read().await.notifications.get(&id).cloned())
    }

    async fn mark_read(&self, id: NotificationId) -> Result<()> {
        let mut t = self.tables.write().await;
        let notification = t
            .notifications
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        notification.read = true;
        Ok(())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<bool> {
        Ok(self.tables.write().await.notifications.remove(&id).is_some())
    }
}
