//! # PostService
//!
//! Orchestrates every exposed post operation: each one loads the post and its
//! community once, asks the [`Authorizer`] for a decision, then performs a
//! single composite store write. Comment and reaction operations live in
//! `comments.rs` and `reactions.rs`.

use bytes::Bytes;
use chrono::Utc;
use domains::{
    CircleId, DomainError, LogAction, MediaKind, NewLogEntry, NewPost, Post, PostAudience, PostFlag,
    PostId, PostMedia, Result, UserId,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::authorization::{Action, Authorizer};
use crate::communities::CommunityRegistry;
use crate::limits::PostLimits;
use crate::notifications::NotificationDispatcher;
use crate::relationships::RelationshipGraph;
use crate::visibility::{PostContext, VisibilityResolver};
use crate::Repositories;

/// What a user submits when creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub text: Option<String>,
    pub media: Option<PostMedia>,
    pub audience: PostAudience,
}

#[derive(Clone)]
pub struct PostService {
    pub(crate) repos: Repositories,
    pub(crate) communities: CommunityRegistry,
    pub(crate) visibility: VisibilityResolver,
    pub(crate) authorizer: Authorizer,
    pub(crate) dispatcher: NotificationDispatcher,
    pub(crate) limits: PostLimits,
}

impl PostService {
    pub fn new(repos: Repositories, limits: PostLimits) -> Self {
        let graph = RelationshipGraph::new(repos.graph.clone());
        let communities = CommunityRegistry::new(repos.communities.clone());
        let visibility =
            VisibilityResolver::new(repos.posts.clone(), repos.graph.clone(), repos.communities.clone());
        let authorizer = Authorizer::new(visibility.clone());
        let dispatcher = NotificationDispatcher::new(repos.interactions.clone(), graph, visibility.clone());
        Self { repos, communities, visibility, authorizer, dispatcher, limits }
    }

    pub fn limits(&self) -> &PostLimits {
        &self.limits
    }

    pub fn visibility(&self) -> &VisibilityResolver {
        &self.visibility
    }

    pub(crate) fn moderation_log(
        ctx: &PostContext,
        action: LogAction,
        actor: UserId,
        target: UserId,
    ) -> Option<NewLogEntry> {
        ctx.community.as_ref().map(|community| NewLogEntry {
            community: community.id,
            action,
            source_user: actor,
            target_user: target,
            post: Some(ctx.post.id),
            created_at: Utc::now(),
        })
    }

    fn check_text(&self, text: &str) -> Result<()> {
        let length = text.chars().count();
        if length > self.limits.post_max_length {
            return Err(DomainError::Invalid(format!(
                "post text exceeds {} characters",
                self.limits.post_max_length
            )));
        }
        Ok(())
    }

    // ── Creation & retrieval ────────────────────────────────────────────────

    /// Stores an upload through the media port, ready to attach to a draft.
    pub async fn upload_media(&self, kind: MediaKind, data: Bytes, content_type: &mime::Mime) -> Result<PostMedia> {
        let expected = match kind {
            MediaKind::Image => mime::IMAGE,
            MediaKind::Video => mime::VIDEO,
        };
        if content_type.type_() != expected {
            return Err(DomainError::Invalid(format!("{content_type} is not a valid {kind:?} type")));
        }
        if data.is_empty() {
            return Err(DomainError::Invalid("empty upload".into()));
        }
        let reference = self.repos.media.store(data, content_type).await?;
        Ok(PostMedia { kind, reference })
    }

    pub async fn create_post(&self, actor: UserId, draft: PostDraft) -> Result<Post> {
        let text = draft.text.filter(|t| !t.trim().is_empty());
        if text.is_none() && draft.media.is_none() {
            return Err(DomainError::Invalid("a post needs text or media".into()));
        }
        if let Some(text) = &text {
            self.check_text(text)?;
        }

        match &draft.audience {
            PostAudience::Public => {}
            PostAudience::Encircled { circles } => self.check_own_circles(actor, circles).await?,
            PostAudience::Community { community } => {
                let community = self.communities.get(*community).await?;
                if self.communities.is_banned(actor, community.id).await? {
                    return Err(DomainError::forbidden("user is banned from the community"));
                }
                if !self.communities.is_member(actor, community.id).await? {
                    return Err(DomainError::forbidden("only members can post in a community"));
                }
            }
        }

        let post = self
            .repos
            .posts
            .insert_post(NewPost {
                creator: actor,
                text,
                media: draft.media,
                audience: draft.audience,
                created_at: Utc::now(),
            })
            .await?;
        info!(actor = %actor, post = %post.id, "post created");
        Ok(post)
    }

    async fn check_own_circles(&self, actor: UserId, circles: &std::collections::BTreeSet<CircleId>) -> Result<()> {
        if circles.is_empty() {
            return Err(DomainError::Invalid("an encircled post needs at least one circle".into()));
        }
        for id in circles {
            match self.repos.graph.get_circle(*id).await? {
                Some(circle) if circle.owner == actor => {}
                Some(_) => return Err(DomainError::Invalid(format!("circle {id} does not belong to the creator"))),
                None => return Err(DomainError::not_found("Circle", id)),
            }
        }
        Ok(())
    }

    pub async fn get_post(&self, actor: UserId, id: PostId) -> Result<Post> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, Action::ViewPost, false).await?;
        Ok(ctx.post)
    }

    pub async fn get_post_by_uuid(&self, actor: UserId, uuid: Uuid) -> Result<Post> {
        let post = self
            .repos
            .posts
            .find_post_by_uuid(uuid)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", uuid))?;
        let ctx = self.visibility.context_for(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::ViewPost, false).await?;
        Ok(ctx.post)
    }

    // ── Mutation ────────────────────────────────────────────────────────────

    /// Replaces the text. Clearing the text is only allowed when media remains.
    pub async fn edit_post(&self, actor: UserId, id: PostId, text: Option<String>) -> Result<Post> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, Action::EditPost, false).await?;

        let text = text.filter(|t| !t.trim().is_empty());
        if text.is_none() && ctx.post.media.is_none() {
            return Err(DomainError::Invalid("cannot remove the text of a text-only post".into()));
        }
        if let Some(text) = &text {
            self.check_text(text)?;
        }

        let post = self.repos.posts.set_post_text(id, text).await?;
        info!(actor = %actor, post = %post.id, "post edited");
        Ok(post)
    }

    /// Deletes the post with everything hanging off it. Staff deleting someone
    /// else's community post leaves a moderation log entry.
    pub async fn delete_post(&self, actor: UserId, id: PostId) -> Result<()> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, Action::DeletePost, false).await?;

        let log = if actor != ctx.post.creator {
            Self::moderation_log(&ctx, LogAction::RemovePost, actor, ctx.post.creator)
        } else {
            None
        };

        let removed = self.repos.posts.delete_post(id, log).await?;
        info!(actor = %actor, post = %id, "post deleted");

        // Files outlive a failed cleanup; the rows are already gone.
        if let Some(media) = removed.and_then(|p| p.media) {
            if let Err(err) = self.repos.media.delete(&media.reference).await {
                warn!(post = %id, reference = %media.reference, error = %err, "failed to delete post media");
            }
        }
        Ok(())
    }

    async fn moderate(&self, actor: UserId, id: PostId, action: Action) -> Result<Post> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, action, false).await?;

        let (flag, log_action) = match action {
            Action::EnableComments => (PostFlag::CommentsEnabled(true), LogAction::EnablePostComments),
            Action::DisableComments => (PostFlag::CommentsEnabled(false), LogAction::DisablePostComments),
            Action::ClosePost => (PostFlag::Closed(true), LogAction::ClosePost),
            Action::OpenPost => (PostFlag::Closed(false), LogAction::OpenPost),
            other => return Err(DomainError::Internal(format!("{other:?} is not a moderation toggle"))),
        };

        let log = Self::moderation_log(&ctx, log_action, actor, ctx.post.creator);
        let post = self.repos.posts.set_post_flag(id, flag, log).await?;
        info!(actor = %actor, post = %id, action = log_action.code(), "post moderated");
        Ok(post)
    }

    pub async fn enable_comments(&self, actor: UserId, id: PostId) -> Result<Post> {
        self.moderate(actor, id, Action::EnableComments).await
    }

    pub async fn disable_comments(&self, actor: UserId, id: PostId) -> Result<Post> {
        self.moderate(actor, id, Action::DisableComments).await
    }

    pub async fn close_post(&self, actor: UserId, id: PostId) -> Result<Post> {
        self.moderate(actor, id, Action::ClosePost).await
    }

    pub async fn open_post(&self, actor: UserId, id: PostId) -> Result<Post> {
        self.moderate(actor, id, Action::OpenPost).await
    }

    // ── Mutes ───────────────────────────────────────────────────────────────

    pub async fn mute_post(&self, actor: UserId, id: PostId) -> Result<()> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, Action::MutePost, false).await?;
        if self.repos.interactions.is_muted(actor, id).await? {
            return Err(DomainError::Conflict("post is already muted".into()));
        }
        self.repos.interactions.insert_mute(actor, id).await
    }

    pub async fn unmute_post(&self, actor: UserId, id: PostId) -> Result<()> {
        let ctx = self.visibility.load(id).await?;
        self.authorizer.authorize(actor, &ctx, Action::UnmutePost, false).await?;
        if !self.repos.interactions.is_muted(actor, id).await? {
            return Err(DomainError::Conflict("post is not muted".into()));
        }
        self.repos.interactions.delete_mute(actor, id).await
    }
}
