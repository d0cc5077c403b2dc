//! # services
//!
//! The post-visibility and interaction-authorization core.
//!
//! Every component reads through the port traits in `domains`; no component
//! holds state beyond the repositories it was handed, so a service value is
//! cheap to clone into each request.

pub mod authorization;
pub mod comments;
pub mod communities;
pub mod limits;
pub mod notifications;
pub mod pagination;
pub mod posts;
pub mod reactions;
pub mod relationships;
pub mod users;
pub mod visibility;

use std::sync::Arc;

use domains::{
    CommunityRepo, EmojiRepo, GraphRepo, InteractionRepo, MediaStorage, NotificationRepo, PostRepo,
    UserRepo,
};

pub use authorization::{evaluate, Action, Authorizer, Facts};
pub use communities::CommunityRegistry;
pub use limits::PostLimits;
pub use notifications::{NotificationDispatcher, NotificationService};
pub use pagination::slice_comments;
pub use posts::{PostDraft, PostService};
pub use relationships::RelationshipGraph;
pub use users::UserDirectory;
pub use visibility::{PostContext, VisibilityResolver};

/// The set of ports the services are wired against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepo>,
    pub graph: Arc<dyn GraphRepo>,
    pub communities: Arc<dyn CommunityRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub interactions: Arc<dyn InteractionRepo>,
    pub emojis: Arc<dyn EmojiRepo>,
    pub notifications: Arc<dyn NotificationRepo>,
    pub media: Arc<dyn MediaStorage>,
}

impl Repositories {
    /// Wires every repository port to a single store that implements them all.
    pub fn from_store<S>(store: Arc<S>, media: Arc<dyn MediaStorage>) -> Self
    where
        S: UserRepo
            + GraphRepo
            + CommunityRepo
            + PostRepo
            + InteractionRepo
            + EmojiRepo
            + NotificationRepo
            + 'static,
    {
        Self {
            users: store.clone(),
            graph: store.clone(),
            communities: store.clone(),
            posts: store.clone(),
            interactions: store.clone(),
            emojis: store.clone(),
            notifications: store,
            media,
        }
    }
}
