//! A fully wired service stack over the in-memory store, plus builders for
//! the users, communities and posts the scenarios need.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::FirstName;
use fake::Fake;

use domains::{
    Circle, CircleId, Community, CommunityType, Emoji, EmojiGroup, EmojiRepo, InteractionRepo, Post,
    PostAudience, PostComment, User,
};
use services::{
    CommunityRegistry, NotificationService, PostDraft, PostLimits, PostService, RelationshipGraph,
    Repositories, UserDirectory,
};
use storage_adapters::{InMemoryMediaStorage, InMemoryStore};

pub struct World {
    pub store: Arc<InMemoryStore>,
    pub media: Arc<InMemoryMediaStorage>,
    pub users: UserDirectory,
    pub graph: RelationshipGraph,
    pub communities: CommunityRegistry,
    pub posts: PostService,
    pub inbox: NotificationService,
    /// A reaction group with two emojis.
    pub reactions: EmojiGroup,
    pub like: Emoji,
    pub heart: Emoji,
    /// A group that cannot be used for reactions.
    pub symbols: EmojiGroup,
    pub star: Emoji,
    sequence: AtomicUsize,
}

impl World {
    pub async fn new() -> Self {
        Self::with_limits(PostLimits::default()).await
    }

    pub async fn with_limits(limits: PostLimits) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let media = Arc::new(InMemoryMediaStorage::new());
        let repos = Repositories::from_store(store.clone(), media.clone());

        let reactions = store.create_emoji_group("reactions", true).await.unwrap();
        let like = store.create_emoji(reactions.id, "thumbs_up").await.unwrap();
        let heart = store.create_emoji(reactions.id, "heart").await.unwrap();
        let symbols = store.create_emoji_group("symbols", false).await.unwrap();
        let star = store.create_emoji(symbols.id, "star").await.unwrap();

        Self {
            users: UserDirectory::new(repos.users.clone()),
            graph: RelationshipGraph::new(repos.graph.clone()),
            communities: CommunityRegistry::new(repos.communities.clone()),
            inbox: NotificationService::new(repos.notifications.clone()),
            posts: PostService::new(repos, limits),
            store,
            media,
            reactions,
            like,
            heart,
            symbols,
            star,
            sequence: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers a user with a generated, unique username.
    pub async fn user(&self) -> User {
        let first: String = FirstName().fake();
        let mut name: String = first.chars().filter(|c| c.is_ascii_alphanumeric()).take(16).collect();
        name.push_str(&format!("_{}", self.next()));
        self.users.register(&name).await.unwrap()
    }

    /// `owner` places `other` in a fresh circle and `other` confirms.
    /// Returns the owner's circle.
    pub async fn connect(&self, owner: &User, other: &User) -> Circle {
        let circle = self
            .graph
            .create_circle(owner.id, &format!("circle {}", self.next()))
            .await
            .unwrap();
        self.graph
            .connect(owner.id, other.id, BTreeSet::from([circle.id]))
            .await
            .unwrap();
        self.graph
            .confirm_connection(other.id, owner.id, BTreeSet::from([other.connections_circle_id]))
            .await
            .unwrap();
        circle
    }

    pub async fn community(&self, creator: &User, kind: CommunityType) -> Community {
        self.communities
            .create_community(creator.id, &format!("community_{}", self.next()), kind)
            .await
            .unwrap()
    }

    /// Adds `user` to the community, inviting them first when it is private.
    pub async fn join(&self, user: &User, community: &Community) {
        if community.is_private() {
            self.communities
                .invite(community.creator, user.id, community.id)
                .await
                .unwrap();
        }
        self.communities.join(user.id, community.id).await.unwrap();
    }

    pub async fn moderator(&self, user: &User, community: &Community) {
        self.join(user, community).await;
        self.communities
            .add_moderator(community.creator, user.id, community.id)
            .await
            .unwrap();
    }

    pub async fn administrator(&self, user: &User, community: &Community) {
        self.join(user, community).await;
        self.communities
            .add_administrator(community.creator, user.id, community.id)
            .await
            .unwrap();
    }

    pub async fn post(&self, creator: &User, audience: PostAudience) -> Post {
        self.posts
            .create_post(creator.id, PostDraft { text: Some(sentence()), media: None, audience })
            .await
            .unwrap()
    }

    pub async fn public_post(&self, creator: &User) -> Post {
        self.post(creator, PostAudience::Public).await
    }

    pub async fn community_post(&self, creator: &User, community: &Community) -> Post {
        self.post(creator, PostAudience::Community { community: community.id }).await
    }

    pub async fn encircled_post(&self, creator: &User, circles: &[CircleId]) -> Post {
        self.post(creator, PostAudience::Encircled { circles: circles.iter().copied().collect() })
            .await
    }

    pub async fn comment(&self, commenter: &User, post: &Post) -> PostComment {
        self.posts
            .create_comment(commenter.id, post.id, sentence())
            .await
            .unwrap()
    }

    /// Comment rows stored for the post, ignoring any visibility filtering.
    pub async fn stored_comment_count(&self, post: &Post) -> usize {
        self.store.list_comments(post.id).await.unwrap().len()
    }
}

/// Short generated text, always within the default length limits.
pub fn sentence() -> String {
    Sentence(3..8).fake()
}
