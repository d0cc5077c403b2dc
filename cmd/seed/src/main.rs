//! # seed
//!
//! Builds a small social graph in the in-memory store, runs a few
//! interactions through the services and logs who can see what.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use configs::{AppConfig, LogConfig};
use domains::{CommunityType, EmojiRepo, MediaKind, MediaStorage, Post, PostAudience, User};
use services::{CommunityRegistry, NotificationService, PostDraft, PostService, RelationshipGraph, Repositories, UserDirectory};
use storage_adapters::{InMemoryStore, LocalMediaStorage};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    let store = Arc::new(InMemoryStore::new());
    let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(
        config.media.root_path.clone(),
        config.media.url_prefix.clone(),
    ));
    let repos = Repositories::from_store(store.clone(), media);

    let users = UserDirectory::new(repos.users.clone());
    let graph = RelationshipGraph::new(repos.graph.clone());
    let communities = CommunityRegistry::new(repos.communities.clone());
    let posts = PostService::new(repos.clone(), config.limits);
    let inbox = NotificationService::new(repos.notifications.clone());

    // ── Emoji catalogue ─────────────────────────────────────────────────────
    let reactions = store.create_emoji_group("reactions", true).await?;
    let like = store.create_emoji(reactions.id, "thumbs_up").await?;
    let heart = store.create_emoji(reactions.id, "heart").await?;
    let flags = store.create_emoji_group("flags", false).await?;
    store.create_emoji(flags.id, "checkered_flag").await?;

    // ── People ──────────────────────────────────────────────────────────────
    let alice = users.register("alice").await?;
    let bob = users.register("bob").await?;
    let carol = users.register("carol").await?;
    let mallory = users.register("mallory").await?;

    let friends = graph.create_circle(alice.id, "Close friends").await?;
    graph.connect(alice.id, bob.id, BTreeSet::from([friends.id])).await?;
    graph
        .confirm_connection(bob.id, alice.id, BTreeSet::from([bob.connections_circle_id]))
        .await?;
    graph.follow(carol.id, alice.id).await?;

    let rust = communities
        .create_community(alice.id, "rustaceans", CommunityType::Public)
        .await?;
    communities.join(bob.id, rust.id).await?;
    communities.join(carol.id, rust.id).await?;
    communities.join(mallory.id, rust.id).await?;
    communities.add_moderator(alice.id, carol.id, rust.id).await?;

    graph.block(mallory.id, bob.id).await?;

    // ── Content ─────────────────────────────────────────────────────────────
    let public = posts
        .create_post(alice.id, draft("Hello, world", PostAudience::Public))
        .await?;
    let circle_only = posts
        .create_post(
            alice.id,
            draft("Friends only", PostAudience::Encircled { circles: BTreeSet::from([friends.id]) }),
        )
        .await?;

    let photo = posts
        .upload_media(MediaKind::Image, Bytes::from_static(b"\x89PNG seed image"), &mime::IMAGE_PNG)
        .await?;
    let community_post = posts
        .create_post(
            bob.id,
            PostDraft {
                text: Some("Borrow checker appreciation thread".into()),
                media: Some(photo),
                audience: PostAudience::Community { community: rust.id },
            },
        )
        .await?;

    posts.create_comment(bob.id, public.id, "Hi Alice!".into()).await?;
    posts.create_comment(carol.id, public.id, "Welcome!".into()).await?;
    posts.create_comment(mallory.id, public.id, "First".into()).await?;
    posts.create_reaction(bob.id, public.id, like.id, reactions.id).await?;
    posts.create_reaction(carol.id, public.id, heart.id, reactions.id).await?;
    posts.create_comment(carol.id, community_post.id, "Seconded".into()).await?;

    posts.close_post(carol.id, community_post.id).await?;

    // ── Report ──────────────────────────────────────────────────────────────
    let everyone = [&alice, &bob, &carol, &mallory];
    for post in [&public, &circle_only, &community_post] {
        report_visibility(&posts, post, &everyone).await?;
    }

    for viewer in everyone {
        if let Ok(comments) = posts.list_comments(viewer.id, public.id, &Default::default()).await {
            info!(viewer = %viewer.username, visible = comments.len(), "comments on the public post");
        }
        let unread = inbox.unread_count(viewer.id).await?;
        info!(user = %viewer.username, unread, "notifications");
    }

    for entry in communities.logs(carol.id, rust.id).await? {
        info!(community = %rust.name, action = entry.action.code(), source = %entry.source_user, target = %entry.target_user, "moderation log");
    }

    info!("seed complete");
    Ok(())
}

fn draft(text: &str, audience: PostAudience) -> PostDraft {
    PostDraft { text: Some(text.into()), media: None, audience }
}

async fn report_visibility(posts: &PostService, post: &Post, viewers: &[&User]) -> anyhow::Result<()> {
    for viewer in viewers {
        let visible = posts.visibility().can_view(viewer.id, post).await?;
        info!(post = %post.id, viewer = %viewer.username, visible, "visibility");
    }
    Ok(())
}
