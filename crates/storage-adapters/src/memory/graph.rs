use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use domains::{
    Circle, CircleId, Connection, ConnectionStatus, DomainError, GraphRepo, Result, User, UserId,
    UserRepo,
};

use super::{InMemoryStore, Tables};

const CONNECTIONS_CIRCLE: &str = "Connections";

impl Tables {
    fn insert_circle(&mut self, owner: UserId, name: &str) -> Circle {
        let id = CircleId(self.next_id());
        let circle = Circle { id, owner, name: name.to_string(), created_at: Utc::now() };
        self.circles.insert(id, circle.clone());
        circle
    }
}

#[async_trait]
impl UserRepo for InMemoryStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == username) {
            return Err(DomainError::Conflict(format!("username {username} is taken")));
        }
        let id = UserId(t.next_id());
        let circle = t.insert_circle(id, CONNECTIONS_CIRCLE);
        let user = User {
            id,
            username: username.to_string(),
            connections_circle_id: circle.id,
            created_at: Utc::now(),
        };
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl GraphRepo for InMemoryStore {
    async fn create_circle(&self, owner: UserId, name: &str) -> Result<Circle> {
        Ok(self.tables.write().await.insert_circle(owner, name))
    }

    async fn get_circle(&self, id: CircleId) -> Result<Option<Circle>> {
        Ok(self.tables.read().await.circles.get(&id).cloned())
    }

    async fn get_connection(&self, owner: UserId, target: UserId) -> Result<Option<Connection>> {
        Ok(self.tables.read().await.connections.get(&(owner, target)).cloned())
    }

    async fn insert_connection(&self, connection: Connection) -> Result<()> {
        let mut t = self.tables.write().await;
        let key = (connection.owner, connection.target);
        if t.connections.contains_key(&key) {
            return Err(DomainError::Conflict("connection already exists".into()));
        }
        t.connections.insert(key, connection);
        Ok(())
    }

    async fn confirm_connection(
        &self,
        confirmer: UserId,
        requester: UserId,
        circles: BTreeSet<CircleId>,
    ) -> Result<()> {
        let mut t = self.tables.write().await;
        let request = t
            .connections
            .get_mut(&(requester, confirmer))
            .ok_or_else(|| DomainError::not_found("Connection", requester))?;
        request.status = ConnectionStatus::Confirmed;

        t.connections.insert(
            (confirmer, requester),
            Connection {
                owner: confirmer,
                target: requester,
                circles,
                status: ConnectionStatus::Confirmed,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn update_connection_circles(
        &self,
        owner: UserId,
        target: UserId,
        circles: BTreeSet<CircleId>,
    ) -> Result<()> {
        let mut t = self.tables.write().await;
        let connection = t
            .connections
            .get_mut(&(owner, target))
            .ok_or_else(|| DomainError::not_found("Connection", target))?;
        connection.circles = circles;
        Ok(())
    }

    async fn delete_connection(&self, a: UserId, b: UserId) -> Result<()> {
        let mut t = self.tables.write().await;
        t.connections.remove(&(a, b));
        t.connections.remove(&(b, a));
        Ok(())
    }

    async fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool> {
        Ok(self.tables.read().await.follows.contains(&(follower, followed)))
    }

    async fn insert_follow(&self, follower: UserId, followed: UserId) -> Result<()> {
        self.tables.write().await.follows.insert((follower, followed));
        Ok(())
    }

    async fn delete_follow(&self, follower: UserId, followed: UserId) -> Result<()> {
        self.tables.write().await.follows.remove(&(follower, followed));
        Ok(())
    }

    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> Result<bool> {
        Ok(self.tables.read().await.blocks.contains(&(blocker, blocked)))
    }

    async fn insert_block(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        let mut t = self.tables.write().await;
        t.blocks.insert((blocker, blocked));
        for pair in [(blocker, blocked), (blocked, blocker)] {
            t.connections.remove(&pair);
            t.follows.remove(&pair);
        }
        Ok(())
    }

    async fn delete_block(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        self.tables.write().await.blocks.remove(&(blocker, blocked));
        Ok(())
    }
}
