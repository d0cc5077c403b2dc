use domains::{DomainError, NotificationKind};
use integration_tests::fixtures::World;

#[tokio::test]
async fn test_comment_notifies_creator_and_prior_commenters() {
    let w = World::new().await;
    let author = w.user().await;
    let first = w.user().await;
    let second = w.user().await;
    let post = w.public_post(&author).await;

    w.comment(&first, &post).await;
    let latest = w.comment(&second, &post).await;

    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), 2);
    let inbox = w.inbox.list(first.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::PostComment { post: post.id, comment: latest.id });
    // Nobody hears about their own comment.
    assert!(w.inbox.list(second.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_muted_post_stays_quiet() {
    let w = World::new().await;
    let author = w.user().await;
    let fan = w.user().await;
    let post = w.public_post(&author).await;

    w.posts.mute_post(author.id, post.id).await.unwrap();
    w.comment(&fan, &post).await;
    w.posts.create_reaction(fan.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    assert!(w.inbox.list(author.id).await.unwrap().is_empty());

    w.posts.unmute_post(author.id, post.id).await.unwrap();
    w.comment(&fan, &post).await;
    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_mute_is_not_idempotent() {
    let w = World::new().await;
    let author = w.user().await;
    let post = w.public_post(&author).await;

    let err = w.posts.unmute_post(author.id, post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    w.posts.mute_post(author.id, post.id).await.unwrap();
    let err = w.posts.mute_post(author.id, post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_blocked_subscribers_are_skipped() {
    let w = World::new().await;
    let author = w.user().await;
    let earlier = w.user().await;
    let actor = w.user().await;
    let post = w.public_post(&author).await;
    w.comment(&earlier, &post).await;

    w.graph.block(earlier.id, actor.id).await.unwrap();
    w.comment(&actor, &post).await;

    assert!(w.inbox.list(earlier.id).await.unwrap().is_empty());
    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_leaving_the_circle_ends_the_subscription() {
    let w = World::new().await;
    let author = w.user().await;
    let friend = w.user().await;
    let other = w.user().await;

    let inner = w.connect(&author, &friend).await;
    let _ = w.connect(&author, &other).await;
    let outer = w.graph.create_circle(author.id, "Outer").await.unwrap();
    w.graph
        .update_connection(author.id, other.id, [inner.id].into())
        .await
        .unwrap();
    let post = w.encircled_post(&author, &[inner.id]).await;

    w.comment(&friend, &post).await;
    w.graph
        .update_connection(author.id, friend.id, [outer.id].into())
        .await
        .unwrap();
    w.comment(&other, &post).await;

    assert!(w.inbox.list(friend.id).await.unwrap().is_empty());
    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_comment_deletion_removes_only_its_notifications() {
    let w = World::new().await;
    let author = w.user().await;
    let fan = w.user().await;
    let post = w.public_post(&author).await;

    let kept = w.comment(&fan, &post).await;
    let removed = w.comment(&fan, &post).await;
    w.posts.delete_comment(fan.id, post.id, removed.id).await.unwrap();

    let inbox = w.inbox.list(author.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::PostComment { post: post.id, comment: kept.id });
}

#[tokio::test]
async fn test_reaction_notifies_the_creator_once() {
    let w = World::new().await;
    let author = w.user().await;
    let fan = w.user().await;
    let commenter = w.user().await;
    let post = w.public_post(&author).await;
    w.comment(&commenter, &post).await;
    let before = w.inbox.list(author.id).await.unwrap().len();

    w.posts.create_reaction(author.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), before);

    let reaction = w.posts.create_reaction(fan.id, post.id, w.like.id, w.reactions.id).await.unwrap();
    w.posts.create_reaction(fan.id, post.id, w.heart.id, w.reactions.id).await.unwrap();
    let reaction_notes: Vec<_> = w
        .inbox
        .list(author.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|n| matches!(n.kind, NotificationKind::PostReaction { .. }))
        .collect();
    assert_eq!(reaction_notes.len(), 1);
    assert!(w.inbox.list(commenter.id).await.unwrap().is_empty());

    w.posts.delete_reaction(fan.id, post.id, reaction.id).await.unwrap();
    assert_eq!(w.inbox.list(author.id).await.unwrap().len(), before);
}

#[tokio::test]
async fn test_inbox_read_and_delete() {
    let w = World::new().await;
    let author = w.user().await;
    let fan = w.user().await;
    let post = w.public_post(&author).await;
    w.comment(&fan, &post).await;

    let note = w.inbox.list(author.id).await.unwrap().remove(0);
    assert_eq!(w.inbox.unread_count(author.id).await.unwrap(), 1);
    w.inbox.mark_read(author.id, note.id).await.unwrap();
    assert_eq!(w.inbox.unread_count(author.id).await.unwrap(), 0);

    assert!(w.inbox.delete(fan.id, note.id).await.unwrap_err().is_rejection());
    w.inbox.delete(author.id, note.id).await.unwrap();
    assert!(w.inbox.list(author.id).await.unwrap().is_empty());
}
