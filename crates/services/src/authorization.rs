//! # Interaction Authorization Engine
//!
//! Authorization is split in two halves:
//! - [`Authorizer::facts`] reads everything a decision needs (visibility,
//!   staff role, ban state) with one role lookup per decision;
//! - [`evaluate`] is a pure rule table over those [`Facts`].
//!
//! Every action first requires the post to be visible to the actor.

use domains::{DomainError, Result, StaffRole, UserId};
use tracing::debug;

use crate::visibility::{PostContext, VisibilityResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewPost,
    ListComments,
    CreateComment,
    EditComment,
    DeleteComment,
    CreateReaction,
    DeleteReaction,
    ListReactions,
    MutePost,
    UnmutePost,
    EditPost,
    DeletePost,
    EnableComments,
    DisableComments,
    ClosePost,
    OpenPost,
}

/// What the engine knows about an actor relative to one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Facts {
    pub can_view: bool,
    pub is_post_creator: bool,
    /// The actor authored the comment or reaction being acted on.
    pub owns_target: bool,
    pub role: StaffRole,
    pub banned: bool,
    pub community_post: bool,
    pub post_closed: bool,
    pub comments_enabled: bool,
}

/// The rule table. Returns the reason for a denial.
pub fn evaluate(action: Action, facts: &Facts) -> std::result::Result<(), &'static str> {
    if !facts.can_view {
        return Err("post is not visible to the actor");
    }

    let staff = facts.role.is_staff();
    let creator = facts.is_post_creator;

    match action {
        Action::ViewPost | Action::ListComments | Action::ListReactions => Ok(()),

        Action::CreateComment | Action::CreateReaction => {
            if facts.banned {
                Err("actor is banned from the community")
            } else if !facts.comments_enabled && !staff {
                Err("comments are disabled on this post")
            } else if facts.post_closed && !(creator || staff) {
                Err("post is closed")
            } else {
                Ok(())
            }
        }

        // Staff gain no edit rights over other people's comments.
        Action::EditComment => {
            if !facts.owns_target {
                Err("only the commenter can edit a comment")
            } else if facts.banned {
                Err("actor is banned from the community")
            } else if !facts.comments_enabled {
                Err("comments are disabled on this post")
            } else if facts.post_closed && !creator {
                Err("post is closed")
            } else {
                Ok(())
            }
        }

        Action::DeleteComment | Action::DeleteReaction => {
            if !(facts.owns_target || creator || staff) {
                Err("not allowed to delete this item")
            } else if facts.post_closed && !(creator || staff) {
                Err("post is closed")
            } else {
                Ok(())
            }
        }

        Action::MutePost | Action::UnmutePost => {
            if facts.banned {
                Err("actor is banned from the community")
            } else if facts.community_post && facts.post_closed && !(creator || staff) {
                Err("post is closed")
            } else {
                Ok(())
            }
        }

        Action::EditPost => {
            if creator {
                Ok(())
            } else {
                Err("only the creator can edit a post")
            }
        }

        Action::DeletePost => {
            if creator || staff {
                Ok(())
            } else {
                Err("only the creator or community staff can delete a post")
            }
        }

        Action::EnableComments | Action::DisableComments | Action::ClosePost | Action::OpenPost => {
            if staff {
                Ok(())
            } else {
                Err("community staff role required")
            }
        }
    }
}

#[derive(Clone)]
pub struct Authorizer {
    visibility: VisibilityResolver,
}

impl Authorizer {
    pub fn new(visibility: VisibilityResolver) -> Self {
        Self { visibility }
    }

    pub async fn facts(&self, actor: UserId, ctx: &PostContext, owns_target: bool) -> Result<Facts> {
        let post = &ctx.post;
        Ok(Facts {
            can_view: self.visibility.can_view_in(actor, ctx).await?,
            is_post_creator: post.creator == actor,
            owns_target,
            role: self.visibility.role_in(actor, ctx).await?,
            banned: self.visibility.is_banned_from(actor, ctx).await?,
            community_post: ctx.community.is_some(),
            post_closed: post.is_closed,
            comments_enabled: post.comments_enabled,
        })
    }

    /// Gathers facts and applies the rule table; denials become `Forbidden`.
    pub async fn authorize(
        &self,
        actor: UserId,
        ctx: &PostContext,
        action: Action,
        owns_target: bool,
    ) -> Result<Facts> {
        let facts = self.facts(actor, ctx, owns_target).await?;
        evaluate(action, &facts).map_err(|reason| {
            debug!(actor = %actor, post = %ctx.post.id, ?action, reason, "authorization denied");
            DomainError::forbidden(reason)
        })?;
        Ok(facts)
    }
}
