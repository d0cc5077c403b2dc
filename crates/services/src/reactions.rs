use std::collections::BTreeMap;

use chrono::Utc;
use domains::{
    DomainError, EmojiCount, EmojiGroup, EmojiGroupId, EmojiId, NewReaction, PostId, PostReaction,
    ReactionId, Result, UserId,
};
use tracing::info;

use crate::authorization::Action;
use crate::posts::PostService;
use crate::visibility::PostContext;

impl PostService {
    /// Reactions on the post whose reactor is not hidden from `actor` by a block.
    async fn visible_reactions(&self, actor: UserId, ctx: &PostContext) -> Result<Vec<PostReaction>> {
        let reactions = self.repos.interactions.list_reactions(ctx.post.id).await?;
        let visible = self
            .visibility
            .visible_authors(actor, ctx, reactions.iter().map(|r| r.reactor))
            .await?;
        Ok(reactions
            .into_iter()
            .filter(|r| visible.contains(&r.reactor))
            .collect())
    }

    /// Reacting again replaces the previous reaction of the same user.
    pub async fn create_reaction(
        &self,
        actor: UserId,
        post: PostId,
        emoji: EmojiId,
        group: EmojiGroupId,
    ) -> Result<PostReaction> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::CreateReaction, false).await?;

        let emoji = self
            .repos
            .emojis
            .get_emoji(emoji)
            .await?
            .ok_or_else(|| DomainError::not_found("Emoji", emoji))?;
        let group = self
            .repos
            .emojis
            .get_emoji_group(group)
            .await?
            .ok_or_else(|| DomainError::not_found("EmojiGroup", group))?;
        if emoji.group != group.id {
            return Err(DomainError::Invalid(format!(
                "emoji {} does not belong to group {}",
                emoji.id, group.id
            )));
        }
        if !group.is_reaction_group {
            return Err(DomainError::Conflict(format!("group {} is not a reaction group", group.id)));
        }

        let recipient = self.dispatcher.reaction_recipient(&ctx, actor).await?;
        let reaction = self
            .repos
            .interactions
            .upsert_reaction(
                NewReaction { post, reactor: actor, emoji: emoji.id, created_at: Utc::now() },
                recipient,
            )
            .await?;
        info!(actor = %actor, post = %post, reaction = %reaction.id, emoji = %emoji.id, "reaction saved");
        Ok(reaction)
    }

    pub async fn delete_reaction(&self, actor: UserId, post: PostId, reaction: ReactionId) -> Result<()> {
        let ctx = self.visibility.load(post).await?;
        let reaction = match self.repos.interactions.get_reaction(reaction).await? {
            Some(r) if r.post == post => r,
            _ => return Err(DomainError::not_found("PostReaction", reaction)),
        };
        self.authorizer
            .authorize(actor, &ctx, Action::DeleteReaction, reaction.reactor == actor)
            .await?;

        self.repos.interactions.delete_reaction(reaction.id).await?;
        info!(actor = %actor, post = %post, reaction = %reaction.id, "reaction deleted");
        Ok(())
    }

    pub async fn list_reactions(
        &self,
        actor: UserId,
        post: PostId,
        emoji: Option<EmojiId>,
    ) -> Result<Vec<PostReaction>> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::ListReactions, false).await?;

        let mut reactions = self.visible_reactions(actor, &ctx).await?;
        if let Some(emoji) = emoji {
            reactions.retain(|r| r.emoji == emoji);
        }
        Ok(reactions)
    }

    /// Per-emoji counts, most used first.
    pub async fn reaction_emoji_counts(&self, actor: UserId, post: PostId) -> Result<Vec<EmojiCount>> {
        let ctx = self.visibility.load(post).await?;
        self.authorizer.authorize(actor, &ctx, Action::ListReactions, false).await?;

        let mut counts: BTreeMap<EmojiId, u64> = BTreeMap::new();
        for reaction in self.visible_reactions(actor, &ctx).await? {
            *counts.entry(reaction.emoji).or_default() += 1;
        }

        let mut counts: Vec<EmojiCount> = counts
            .into_iter()
            .map(|(emoji, count)| EmojiCount { emoji, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.emoji.cmp(&b.emoji)));
        Ok(counts)
    }

    /// Emoji groups usable for reactions.
    pub async fn reaction_emoji_groups(&self) -> Result<Vec<EmojiGroup>> {
        let mut groups = self.repos.emojis.list_emoji_groups().await?;
        groups.retain(|g| g.is_reaction_group);
        Ok(groups)
    }
}
