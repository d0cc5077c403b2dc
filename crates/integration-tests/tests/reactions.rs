use domains::{CommunityType, DomainError, EmojiCount};
use integration_tests::fixtures::World;

#[tokio::test]
async fn test_reacting_twice_replaces_the_emoji() {
    let w = World::new().await;
    let author = w.user().await;
    let fan = w.user().await;
    let post = w.public_post(&author).await;

    let first = w.posts.create_reaction(fan.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    let second = w.posts.create_reaction(fan.id, post.id, w.heart.id, w.reactions.id).await.unwrap();

    assert_eq!(first.id, second.id);
    let reactions = w.posts.list_reactions(author.id, post.id, None).await.unwrap();
    assert_eq!(reactions.len(), 1);
    assert_eq!(reactions[0].emoji, w.heart.id);
}

#[tokio::test]
async fn test_emoji_must_come_from_a_reaction_group() {
    let w = World::new().await;
    let author = w.user().await;
    let post = w.public_post(&author).await;

    let err = w
        .posts
        .create_reaction(author.id, post.id, w.star.id, w.symbols.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = w
        .posts
        .create_reaction(author.id, post.id, w.star.id, w.reactions.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
}

#[tokio::test]
async fn test_counts_and_emoji_filter() {
    let w = World::new().await;
    let author = w.user().await;
    let post = w.public_post(&author).await;
    for emoji in [w.like.id, w.like.id, w.heart.id] {
        let reactor = w.user().await;
        w.posts.create_reaction(reactor.id, post.id, emoji, w.reactions.id).await.unwrap();
    }

    let counts = w.posts.reaction_emoji_counts(author.id, post.id).await.unwrap();
    assert_eq!(
        counts,
        vec![
            EmojiCount { emoji: w.like.id, count: 2 },
            EmojiCount { emoji: w.heart.id, count: 1 },
        ]
    );

    let hearts = w.posts.list_reactions(author.id, post.id, Some(w.heart.id)).await.unwrap();
    assert_eq!(hearts.len(), 1);
}

#[tokio::test]
async fn test_blocked_reactors_are_not_counted() {
    let w = World::new().await;
    let author = w.user().await;
    let blocked = w.user().await;
    let other = w.user().await;
    let post = w.public_post(&author).await;
    w.posts.create_reaction(blocked.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    w.posts.create_reaction(other.id, post.id, w.like.id, w.reactions.id).await.unwrap();

    w.graph.block(author.id, blocked.id).await.unwrap();

    let counts = w.posts.reaction_emoji_counts(author.id, post.id).await.unwrap();
    assert_eq!(counts, vec![EmojiCount { emoji: w.like.id, count: 1 }]);
}

#[tokio::test]
async fn test_staff_reactors_stay_countable_across_blocks() {
    let w = World::new().await;
    let owner = w.user().await;
    let moderator = w.user().await;
    let member = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;
    w.moderator(&moderator, &community).await;
    w.join(&member, &community).await;

    let post = w.community_post(&member, &community).await;
    w.posts.create_reaction(moderator.id, post.id, w.heart.id, w.reactions.id).await.unwrap();
    w.graph.block(member.id, moderator.id).await.unwrap();

    let counts = w.posts.reaction_emoji_counts(member.id, post.id).await.unwrap();
    assert_eq!(counts, vec![EmojiCount { emoji: w.heart.id, count: 1 }]);
}

#[tokio::test]
async fn test_blocked_user_cannot_react() {
    let w = World::new().await;
    let author = w.user().await;
    let blocked = w.user().await;
    let post = w.public_post(&author).await;
    w.graph.block(author.id, blocked.id).await.unwrap();

    let err = w
        .posts
        .create_reaction(blocked.id, post.id, w.like.id, w.reactions.id)
        .await
        .unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_reactions_follow_the_comment_gate() {
    let w = World::new().await;
    let owner = w.user().await;
    let moderator = w.user().await;
    let author = w.user().await;
    let member = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;
    w.moderator(&moderator, &community).await;
    w.join(&author, &community).await;
    w.join(&member, &community).await;
    let post = w.community_post(&author, &community).await;

    w.posts.disable_comments(moderator.id, post.id).await.unwrap();
    assert!(w.posts.create_reaction(member.id, post.id, w.like.id, w.reactions.id).await.is_err());
    assert!(w.posts.create_reaction(moderator.id, post.id, w.like.id, w.reactions.id).await.is_ok());

    w.posts.enable_comments(moderator.id, post.id).await.unwrap();
    w.posts.close_post(moderator.id, post.id).await.unwrap();
    assert!(w.posts.create_reaction(member.id, post.id, w.like.id, w.reactions.id).await.is_err());
    assert!(w.posts.create_reaction(author.id, post.id, w.like.id, w.reactions.id).await.is_ok());
}

#[tokio::test]
async fn test_reaction_delete_rights() {
    let w = World::new().await;
    let owner = w.user().await;
    let author = w.user().await;
    let reactor = w.user().await;
    let stranger = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;
    w.join(&author, &community).await;
    w.join(&reactor, &community).await;
    let post = w.community_post(&author, &community).await;

    let reaction = w.posts.create_reaction(reactor.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    assert!(w.posts.delete_reaction(stranger.id, post.id, reaction.id).await.is_err());
    w.posts.delete_reaction(reactor.id, post.id, reaction.id).await.unwrap();

    let reaction = w.posts.create_reaction(reactor.id, post.id, w.heart.id, w.reactions.id).await.unwrap();
    w.posts.close_post(owner.id, post.id).await.unwrap();
    assert!(w.posts.delete_reaction(reactor.id, post.id, reaction.id).await.is_err());
    w.posts.delete_reaction(author.id, post.id, reaction.id).await.unwrap();

    assert!(w.posts.list_reactions(author.id, post.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_reaction_groups_are_offered() {
    let w = World::new().await;
    let groups = w.posts.reaction_emoji_groups().await.unwrap();
    assert_eq!(groups, vec![w.reactions.clone()]);
}
