use bytes::Bytes;
use domains::{CommunityType, DomainError, MediaKind, PostAudience};
use integration_tests::fixtures::{sentence, World};
use services::{PostDraft, PostLimits};

fn text(text: &str, audience: PostAudience) -> PostDraft {
    PostDraft { text: Some(text.into()), media: None, audience }
}

#[tokio::test]
async fn test_post_needs_text_or_media() {
    let w = World::new().await;
    let author = w.user().await;

    let err = w
        .posts
        .create_post(author.id, PostDraft { text: Some("  ".into()), media: None, audience: PostAudience::Public })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));

    let media = w
        .posts
        .upload_media(MediaKind::Video, Bytes::from_static(b"clip"), &"video/mp4".parse().unwrap())
        .await
        .unwrap();
    let post = w
        .posts
        .create_post(author.id, PostDraft { text: None, media: Some(media), audience: PostAudience::Public })
        .await
        .unwrap();
    assert!(!post.has_text());
}

#[tokio::test]
async fn test_upload_checks_the_content_type() {
    let w = World::new().await;
    let err = w
        .posts
        .upload_media(MediaKind::Image, Bytes::from_static(b"clip"), &"video/mp4".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
    assert!(w.media.is_empty());
}

#[tokio::test]
async fn test_post_length_limit() {
    let w = World::with_limits(PostLimits { post_max_length: 10, ..PostLimits::default() }).await;
    let author = w.user().await;
    let err = w
        .posts
        .create_post(author.id, text("far too long for this", PostAudience::Public))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
}

#[tokio::test]
async fn test_encircled_post_uses_own_circles() {
    let w = World::new().await;
    let author = w.user().await;
    let other = w.user().await;

    let foreign = PostAudience::Encircled { circles: [other.connections_circle_id].into() };
    assert!(w.posts.create_post(author.id, text("hi", foreign)).await.is_err());

    let empty = PostAudience::Encircled { circles: Default::default() };
    assert!(w.posts.create_post(author.id, text("hi", empty)).await.is_err());
}

#[tokio::test]
async fn test_community_post_requires_membership() {
    let w = World::new().await;
    let owner = w.user().await;
    let outsider = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;

    let audience = PostAudience::Community { community: community.id };
    let err = w.posts.create_post(outsider.id, text("hi", audience)).await.unwrap_err();
    assert!(err.is_rejection());
}

#[tokio::test]
async fn test_only_the_creator_edits() {
    let w = World::new().await;
    let owner = w.user().await;
    let author = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;
    w.join(&author, &community).await;
    let post = w.community_post(&author, &community).await;

    let edited = w.posts.edit_post(author.id, post.id, Some("edited".into())).await.unwrap();
    assert!(edited.is_edited);
    assert_eq!(edited.text.as_deref(), Some("edited"));

    // Staff can moderate but not rewrite.
    assert!(w.posts.edit_post(owner.id, post.id, Some(sentence())).await.is_err());
}

#[tokio::test]
async fn test_edit_cannot_empty_a_text_only_post() {
    let w = World::new().await;
    let author = w.user().await;
    let post = w.public_post(&author).await;

    let err = w.posts.edit_post(author.id, post.id, None).await.unwrap_err();
    assert!(matches!(err, DomainError::Invalid(_)));
    assert!(w.posts.get_post(author.id, post.id).await.unwrap().has_text());
}

#[tokio::test]
async fn test_closed_community_post_mutes_need_creator_or_staff() {
    let w = World::new().await;
    let owner = w.user().await;
    let author = w.user().await;
    let member = w.user().await;
    let community = w.community(&owner, CommunityType::Public).await;
    w.join(&author, &community).await;
    w.join(&member, &community).await;
    let post = w.community_post(&author, &community).await;
    w.posts.close_post(owner.id, post.id).await.unwrap();

    assert!(w.posts.mute_post(member.id, post.id).await.is_err());
    w.posts.mute_post(author.id, post.id).await.unwrap();
    w.posts.mute_post(owner.id, post.id).await.unwrap();
}
