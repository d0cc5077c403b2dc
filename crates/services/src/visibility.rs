//! # Post Visibility Resolver
//!
//! Decides whether a viewer may see a post, and which authors' comments and
//! reactions a viewer may see on it.
//!
//! Order of checks:
//! 1. the creator always sees their own post;
//! 2. a viewer banned from the post's community sees none of its posts;
//! 3. a block in either direction hides the post, unless the post belongs to
//!    a community where either party is staff;
//! 4. the audience decides: public posts are open, encircled posts need a
//!    granted circle in common, community posts need membership only when the
//!    community is private.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use domains::{
    Community, CommunityRepo, DomainError, GraphRepo, Post, PostAudience, PostId, PostRepo, Result,
    StaffRole, UserId,
};

use crate::communities::CommunityRegistry;
use crate::relationships::RelationshipGraph;

/// A post together with its community, loaded once per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContext {
    pub post: Post,
    pub community: Option<Community>,
}

#[derive(Clone)]
pub struct VisibilityResolver {
    posts: Arc<dyn PostRepo>,
    graph: RelationshipGraph,
    communities: CommunityRegistry,
}

impl VisibilityResolver {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        graph: Arc<dyn GraphRepo>,
        communities: Arc<dyn CommunityRepo>,
    ) -> Self {
        Self {
            posts,
            graph: RelationshipGraph::new(graph),
            communities: CommunityRegistry::new(communities),
        }
    }

    pub async fn load(&self, id: PostId) -> Result<PostContext> {
        let post = self
            .posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;
        self.context_for(post).await
    }

    pub async fn context_for(&self, post: Post) -> Result<PostContext> {
        let community = match post.community() {
            Some(id) => Some(self.communities.get(id).await?),
            None => None,
        };
        Ok(PostContext { post, community })
    }

    pub async fn can_view(&self, viewer: UserId, post: &Post) -> Result<bool> {
        let ctx = self.context_for(post.clone()).await?;
        self.can_view_in(viewer, &ctx).await
    }

    pub async fn can_view_in(&self, viewer: UserId, ctx: &PostContext) -> Result<bool> {
        let post = &ctx.post;
        if viewer == post.creator {
            return Ok(true);
        }

        if let Some(community) = &ctx.community {
            if self.communities.is_banned(viewer, community.id).await? {
                return Ok(false);
            }
        }

        if self.hidden_by_block(viewer, post.creator, ctx.community.as_ref()).await? {
            return Ok(false);
        }

        match &post.audience {
            PostAudience::Public => Ok(true),
            PostAudience::Encircled { circles } => {
                let granted = self.graph.circles_granted_to(post.creator, viewer).await?;
                Ok(!granted.is_disjoint(circles))
            }
            PostAudience::Community { .. } => match &ctx.community {
                Some(community) if community.is_private() => {
                    self.communities.is_member(viewer, community.id).await
                }
                Some(_) => Ok(true),
                None => Ok(false),
            },
        }
    }

    /// True when a block between `viewer` and `author` hides the author's
    /// content. Inside a community, staff on either side lifts the block.
    pub async fn hidden_by_block(
        &self,
        viewer: UserId,
        author: UserId,
        community: Option<&Community>,
    ) -> Result<bool> {
        if viewer == author || !self.graph.is_blocked_either_direction(viewer, author).await? {
            return Ok(false);
        }
        match community {
            None => Ok(true),
            Some(community) => {
                let exempt = self.communities.is_staff(viewer, community).await?
                    || self.communities.is_staff(author, community).await?;
                Ok(!exempt)
            }
        }
    }

    /// Of `authors`, those whose comments and reactions `viewer` may see on
    /// the post described by `ctx`.
    pub async fn visible_authors(
        &self,
        viewer: UserId,
        ctx: &PostContext,
        authors: impl IntoIterator<Item = UserId>,
    ) -> Result<BTreeSet<UserId>> {
        let mut verdicts: HashMap<UserId, bool> = HashMap::new();
        for author in authors {
            if verdicts.contains_key(&author) {
                continue;
            }
            let hidden = self.hidden_by_block(viewer, author, ctx.community.as_ref()).await?;
            verdicts.insert(author, !hidden);
        }
        Ok(verdicts
            .into_iter()
            .filter_map(|(author, visible)| visible.then_some(author))
            .collect())
    }

    /// Role of `user` in the post's community; `None` outside communities.
    pub async fn role_in(&self, user: UserId, ctx: &PostContext) -> Result<StaffRole> {
        match &ctx.community {
            Some(community) => self.communities.role_in(user, community).await,
            None => Ok(StaffRole::None),
        }
    }

    pub async fn is_banned_from(&self, user: UserId, ctx: &PostContext) -> Result<bool> {
        match &ctx.community {
            Some(community) => self.communities.is_banned(user, community.id).await,
            None => Ok(false),
        }
    }
}
