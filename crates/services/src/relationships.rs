//! # Relationship Graph
//!
//! Connections, circles, follows and blocks between users.
//!
//! Blocks are stored directionally (who blocked whom) but every visibility
//! decision uses [`RelationshipGraph::is_blocked_either_direction`].

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use domains::{
    Circle, CircleId, Connection, ConnectionStatus, DomainError, GraphRepo, Result, UserId,
};
use tracing::info;

const CIRCLE_NAME_MAX_LENGTH: usize = 100;

#[derive(Clone)]
pub struct RelationshipGraph {
    graph: Arc<dyn GraphRepo>,
}

impl RelationshipGraph {
    pub fn new(graph: Arc<dyn GraphRepo>) -> Self {
        Self { graph }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// True once `b` has confirmed a request from `a` (or vice versa).
    pub async fn is_connected(&self, a: UserId, b: UserId) -> Result<bool> {
        Ok(self
            .graph
            .get_connection(a, b)
            .await?
            .is_some_and(|c| c.is_confirmed()))
    }

    /// Circles of `owner` that `viewer` sits in. Empty unless confirmed.
    pub async fn circles_granted_to(&self, owner: UserId, viewer: UserId) -> Result<BTreeSet<CircleId>> {
        Ok(match self.graph.get_connection(owner, viewer).await? {
            Some(connection) if connection.is_confirmed() => connection.circles,
            _ => BTreeSet::new(),
        })
    }

    pub async fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool> {
        self.graph.is_following(follower, followed).await
    }

    pub async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        self.graph.is_blocked(blocker, blocked).await
    }

    pub async fn is_blocked_either_direction(&self, a: UserId, b: UserId) -> Result<bool> {
        Ok(self.graph.is_blocked(a, b).await? || self.graph.is_blocked(b, a).await?)
    }

    // ── Circles ─────────────────────────────────────────────────────────────

    pub async fn create_circle(&self, owner: UserId, name: &str) -> Result<Circle> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > CIRCLE_NAME_MAX_LENGTH {
            return Err(DomainError::Invalid("circle name must be 1-100 characters".into()));
        }
        self.graph.create_circle(owner, name).await
    }

    async fn check_circles_owned(&self, owner: UserId, circles: &BTreeSet<CircleId>) -> Result<()> {
        if circles.is_empty() {
            return Err(DomainError::Invalid("at least one circle is required".into()));
        }
        for id in circles {
            let circle = self
                .graph
                .get_circle(*id)
                .await?
                .ok_or_else(|| DomainError::not_found("Circle", id))?;
            if circle.owner != owner {
                return Err(DomainError::Invalid(format!("circle {id} does not belong to user {owner}")));
            }
        }
        Ok(())
    }

    // ── Connections ─────────────────────────────────────────────────────────

    /// Sends a connection request, placing `target` in the requester's circles.
    pub async fn connect(&self, requester: UserId, target: UserId, circles: BTreeSet<CircleId>) -> Result<()> {
        if requester == target {
            return Err(DomainError::Invalid("cannot connect with oneself".into()));
        }
        if self.is_blocked_either_direction(requester, target).await? {
            return Err(DomainError::forbidden("users are blocked"));
        }
        if self.graph.get_connection(requester, target).await?.is_some()
            || self.graph.get_connection(target, requester).await?.is_some()
        {
            return Err(DomainError::Conflict("connection already exists".into()));
        }
        self.check_circles_owned(requester, &circles).await?;

        self.graph
            .insert_connection(Connection {
                owner: requester,
                target,
                circles,
                status: ConnectionStatus::Pending,
                created_at: Utc::now(),
            })
            .await?;
        info!(requester = %requester, target = %target, "connection requested");
        Ok(())
    }

    /// Accepts a pending request from `requester`, granting them `circles`.
    pub async fn confirm_connection(
        &self,
        confirmer: UserId,
        requester: UserId,
        circles: BTreeSet<CircleId>,
    ) -> Result<()> {
        let pending = self.graph.get_connection(requester, confirmer).await?;
        match pending {
            Some(c) if !c.is_confirmed() => {}
            Some(_) => return Err(DomainError::Conflict("connection already confirmed".into())),
            None => return Err(DomainError::not_found("ConnectionRequest", requester)),
        }
        self.check_circles_owned(confirmer, &circles).await?;

        self.graph.confirm_connection(confirmer, requester, circles).await?;
        info!(confirmer = %confirmer, requester = %requester, "connection confirmed");
        Ok(())
    }

    /// Re-scopes which circles `target` sits in. The connection itself stays.
    pub async fn update_connection(&self, owner: UserId, target: UserId, circles: BTreeSet<CircleId>) -> Result<()> {
        if !self.is_connected(owner, target).await? {
            return Err(DomainError::not_found("Connection", target));
        }
        self.check_circles_owned(owner, &circles).await?;
        self.graph.update_connection_circles(owner, target, circles).await
    }

    pub async fn disconnect(&self, a: UserId, b: UserId) -> Result<()> {
        if self.graph.get_connection(a, b).await?.is_none() && self.graph.get_connection(b, a).await?.is_none() {
            return Err(DomainError::not_found("Connection", b));
        }
        self.graph.delete_connection(a, b).await?;
        info!(user = %a, other = %b, "disconnected");
        Ok(())
    }

    // ── Follows ─────────────────────────────────────────────────────────────

    pub async fn follow(&self, follower: UserId, followed: UserId) -> Result<()> {
        if follower == followed {
            return Err(DomainError::Invalid("cannot follow oneself".into()));
        }
        if self.is_blocked_either_direction(follower, followed).await? {
            return Err(DomainError::forbidden("users are blocked"));
        }
        if self.graph.is_following(follower, followed).await? {
            return Err(DomainError::Conflict("already following".into()));
        }
        self.graph.insert_follow(follower, followed).await
    }

    pub async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<()> {
        if !self.graph.is_following(follower, followed).await? {
            return Err(DomainError::not_found("Follow", followed));
        }
        self.graph.delete_follow(follower, followed).await
    }

    // ── Blocks ──────────────────────────────────────────────────────────────

    /// Blocking also severs connections and follows in both directions.
    pub async fn block(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        if blocker == blocked {
            return Err(DomainError::Invalid("cannot block oneself".into()));
        }
        if self.graph.is_blocked(blocker, blocked).await? {
            return Err(DomainError::Conflict("user already blocked".into()));
        }
        self.graph.insert_block(blocker, blocked).await?;
        info!(blocker = %blocker, blocked = %blocked, "user blocked");
        Ok(())
    }

    pub async fn unblock(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        if !self.graph.is_blocked(blocker, blocked).await? {
            return Err(DomainError::not_found("Block", blocked));
        }
        self.graph.delete_block(blocker, blocked).await?;
        info!(blocker = %blocker, blocked = %blocked, "user unblocked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockGraphRepo;
    use mockall::predicate::eq;

    fn connection(owner: u64, target: u64, status: ConnectionStatus, circles: &[u64]) -> Connection {
        Connection {
            owner: UserId(owner),
            target: UserId(target),
            circles: circles.iter().map(|c| CircleId(*c)).collect(),
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pending_connection_grants_nothing() {
        let mut repo = MockGraphRepo::new();
        repo.expect_get_connection()
            .returning(|o, t| Ok(Some(connection(o.0, t.0, ConnectionStatus::Pending, &[1]))));

        let graph = RelationshipGraph::new(Arc::new(repo));
        assert!(!graph.is_connected(UserId(1), UserId(2)).await.unwrap());
        assert!(graph.circles_granted_to(UserId(1), UserId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_connection_grants_its_circles() {
        let mut repo = MockGraphRepo::new();
        repo.expect_get_connection()
            .with(eq(UserId(1)), eq(UserId(2)))
            .returning(|o, t| Ok(Some(connection(o.0, t.0, ConnectionStatus::Confirmed, &[4, 5]))));

        let graph = RelationshipGraph::new(Arc::new(repo));
        let circles = graph.circles_granted_to(UserId(1), UserId(2)).await.unwrap();
        assert_eq!(circles, BTreeSet::from([CircleId(4), CircleId(5)]));
    }

    #[tokio::test]
    async fn test_block_is_checked_in_both_directions() {
        let mut repo = MockGraphRepo::new();
        repo.expect_is_blocked()
            .returning(|blocker, blocked| Ok(blocker == UserId(2) && blocked == UserId(1)));

        let graph = RelationshipGraph::new(Arc::new(repo));
        assert!(!graph.is_blocked(UserId(1), UserId(2)).await.unwrap());
        assert!(graph.is_blocked_either_direction(UserId(1), UserId(2)).await.unwrap());
        assert!(graph.is_blocked_either_direction(UserId(2), UserId(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_cannot_block_twice() {
        let mut repo = MockGraphRepo::new();
        repo.expect_is_blocked().returning(|_, _| Ok(true));
        repo.expect_insert_block().never();

        let graph = RelationshipGraph::new(Arc::new(repo));
        let err = graph.block(UserId(1), UserId(2)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_connect_rejects_foreign_circle() {
        let mut repo = MockGraphRepo::new();
        repo.expect_is_blocked().returning(|_, _| Ok(false));
        repo.expect_get_connection().returning(|_, _| Ok(None));
        repo.expect_get_circle().returning(|id| {
            Ok(Some(Circle {
                id,
                owner: UserId(99),
                name: "friends".into(),
                created_at: Utc::now(),
            }))
        });
        repo.expect_insert_connection().never();

        let graph = RelationshipGraph::new(Arc::new(repo));
        let err = graph
            .connect(UserId(1), UserId(2), BTreeSet::from([CircleId(3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_circle_name_length_counts_characters() {
        let mut repo = MockGraphRepo::new();
        repo.expect_create_circle().times(1).returning(|owner, name| {
            Ok(Circle { id: CircleId(1), owner, name: name.to_owned(), created_at: Utc::now() })
        });
        let graph = RelationshipGraph::new(Arc::new(repo));

        let widest = "ü".repeat(CIRCLE_NAME_MAX_LENGTH);
        assert!(widest.len() > CIRCLE_NAME_MAX_LENGTH);
        let circle = graph.create_circle(UserId(1), &widest).await.unwrap();
        assert_eq!(circle.name, widest);

        let too_long = "ü".repeat(CIRCLE_NAME_MAX_LENGTH + 1);
        let err = graph.create_circle(UserId(1), &too_long).await.unwrap_err();
        assert!(matches!(err, DomainError::Invalid(_)));
    }
}
