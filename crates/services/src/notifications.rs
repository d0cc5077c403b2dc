//! # Notification Dispatcher
//!
//! Computes who hears about a new comment or reaction, and serves each
//! user's notification inbox. Notifications are written by the same store
//! call that writes the comment or reaction, and removed with it.

use std::sync::Arc;

use domains::{
    DomainError, InteractionRepo, Notification, NotificationId, NotificationRepo, Result, UserId,
};
use tracing::info;

use crate::relationships::RelationshipGraph;
use crate::visibility::{PostContext, VisibilityResolver};

#[derive(Clone)]
pub struct NotificationDispatcher {
    interactions: Arc<dyn InteractionRepo>,
    graph: RelationshipGraph,
    visibility: VisibilityResolver,
}

impl NotificationDispatcher {
    pub fn new(
        interactions: Arc<dyn InteractionRepo>,
        graph: RelationshipGraph,
        visibility: VisibilityResolver,
    ) -> Self {
        Self { interactions, graph, visibility }
    }

    /// Subscribers of the post: its creator and prior commenters, minus the
    /// actor, anyone who muted the post, anyone blocked with the actor in
    /// either direction, and anyone who can no longer see the post.
    pub async fn comment_subscribers(&self, ctx: &PostContext, actor: UserId) -> Result<Vec<UserId>> {
        let post = &ctx.post;
        let mut candidates = self.interactions.commenters(post.id).await?;
        candidates.insert(post.creator);
        candidates.remove(&actor);

        let muters = self.interactions.muters(post.id).await?;
        let mut subscribers = Vec::with_capacity(candidates.len());
        for user in candidates.difference(&muters) {
            if self.graph.is_blocked_either_direction(actor, *user).await? {
                continue;
            }
            if !self.visibility.can_view_in(*user, ctx).await? {
                continue;
            }
            subscribers.push(*user);
        }
        Ok(subscribers)
    }

    /// Only the post creator hears about reactions, never about their own.
    pub async fn reaction_recipient(&self, ctx: &PostContext, actor: UserId) -> Result<Option<UserId>> {
        let creator = ctx.post.creator;
        if creator == actor
            || self.interactions.is_muted(creator, ctx.post.id).await?
            || self.graph.is_blocked_either_direction(actor, creator).await?
        {
            return Ok(None);
        }
        Ok(Some(creator))
    }
}

/// A user's notification inbox.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepo>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepo>) -> Self {
        Self { notifications }
    }

    pub async fn list(&self, owner: UserId) -> Result<Vec<Notification>> {
        self.notifications.list_notifications(owner).await
    }

    pub async fn unread_count(&self, owner: UserId) -> Result<usize> {
        Ok(self
            .notifications
            .list_notifications(owner)
            .await?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// Someone else's notification reads as missing.
    async fn owned(&self, actor: UserId, id: NotificationId) -> Result<Notification> {
        match self.notifications.get_notification(id).await? {
            Some(notification) if notification.owner == actor => Ok(notification),
            _ => Err(DomainError::not_found("Notification", id)),
        }
    }

    pub async fn mark_read(&self, actor: UserId, id: NotificationId) -> Result<()> {
        self.owned(actor, id).await?;
        self.notifications.mark_read(id).await
    }

    pub async fn delete(&self, actor: UserId, id: NotificationId) -> Result<()> {
        self.owned(actor, id).await?;
        self.notifications.delete_notification(id).await?;
        info!(owner = %actor, notification = %id, "notification deleted");
        Ok(())
    }
}
