use chrono::Utc;
use domains::{
    CommentId, CommentsQuery, DomainError, LogAction, NewComment, PostComment, PostId, Result, UserId,
};
use tracing::info;

use crate::authorization::Action;
use crate::pagination::slice_comments;
use crate::posts::PostService;
use crate::visibility::PostContext;

impl PostService {
    fn check_comment_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(DomainError::Invalid("comment text cannot be empty".into()));
        }
        if text.chars().count() > self.limits.comment_max_length {
            return Err(DomainError::Invalid(format!(
                "comment text exceeds {} characters",
                self.limits.comment_max_length
            )));
        }
        Ok(())
    }

    /// The comment, if it belongs to the post; anything else reads as missing.
    async fn comment_on(&self, ctx: &PostContext, id: CommentId) -> Result<PostComment> {
        match self.repos.interactions.get_comment(id).await? {
            Some(comment) if comment.post == ctx.post.id => Ok(comment),
            _ => Err(DomainError::not_found("PostComment", id)),
        }
    }

    /// Comments visible to `actor`, cursor-sliced. Closing a post does not hide
    /// its comments; comments by users blocked with the actor are left out
    /// unless a community staff member is on either side of the block.
    pub async fn list_comments(&self, actor: UserId, post: PostId, query: &CommentsQuery) -> Result<Vec<PostComment>> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::ListComments, false).await?;

        let comments = self.repos.interactions.list_comments(post).await?;
        let visible = self
            .visibility
            .visible_authors(actor, &ctx, comments.iter().map(|c| c.commenter))
            .await?;
        let comments = comments
            .into_iter()
            .filter(|c| visible.contains(&c.commenter))
            .collect();
        Ok(slice_comments(comments, query, &self.limits))
    }

    pub async fn comments_count(&self, actor: UserId, post: PostId) -> Result<usize> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::ListComments, false).await?;

        let comments = self.repos.interactions.list_comments(post).await?;
        let visible = self
            .visibility
            .visible_authors(actor, &ctx, comments.iter().map(|c| c.commenter))
            .await?;
        Ok(comments.iter().filter(|c| visible.contains(&c.commenter)).count())
    }

    /// Creates the comment and notifies the post's subscribers in one write.
    pub async fn create_comment(&self, actor: UserId, post: PostId, text: String) -> Result<PostComment> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::CreateComment, false).await?;
        self.check_comment_text(&text)?;

        let subscribers = self.dispatcher.comment_subscribers(&ctx, actor).await?;
        let notified = subscribers.len();
        let comment = self
            .repos
            .interactions
            .insert_comment(
                NewComment { post, commenter: actor, text, created_at: Utc::now() },
                subscribers,
            )
            .await?;
        info!(actor = %actor, post = %post, comment = %comment.id, notified, "comment created");
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        actor: UserId,
        post: PostId,
        comment: CommentId,
        text: String,
    ) -> Result<PostComment> {
        let ctx = self.visibility.load(post).await?;
        let comment = self.comment_on(&ctx, comment).await?;
        self.authorizer
            .authorize(actor, &ctx, Action::EditComment, comment.commenter == actor)
            .await?;
        self.check_comment_text(&text)?;

        self.repos.interactions.set_comment_text(comment.id, text).await
    }

    /// Deletes the comment and its notifications. Staff removing someone
    /// else's comment in a community leaves a moderation log entry.
    pub async fn delete_comment(&self, actor: UserId, post: PostId, comment: CommentId) -> Result<()> {
        let ctx = self.visibility.load(post).await?;
        let comment = self.comment_on(&ctx, comment).await?;
        let facts = self
            .authorizer
            .authorize(actor, &ctx, Action::DeleteComment, comment.commenter == actor)
            .await?;

        let log = if comment.commenter != actor && facts.role.is_staff() {
            Self::moderation_log(&ctx, LogAction::RemovePostComment, actor, comment.commenter)
        } else {
            None
        };
        self.repos.interactions.delete_comment(comment.id, log).await?;
        info!(actor = %actor, post = %post, comment = %comment.id, "comment deleted");
        Ok(())
    }
}
