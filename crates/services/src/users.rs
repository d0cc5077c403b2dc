use std::sync::Arc;

use domains::{DomainError, Result, User, UserId, UserRepo};
use tracing::info;

const USERNAME_MAX_LENGTH: usize = 30;

/// Registration and lookup of user accounts.
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepo>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    /// Usernames are 1..=30 characters of ASCII letters, digits, `_` or `.`,
    /// unique across the platform.
    pub async fn register(&self, username: &str) -> Result<User> {
        let valid = !username.is_empty()
            && username.len() <= USERNAME_MAX_LENGTH
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid {
            return Err(DomainError::Invalid(format!("invalid username '{username}'")));
        }

        if self.users.find_user_by_username(username).await?.is_some() {
            return Err(DomainError::Conflict(format!("username '{username}' is taken")));
        }

        let user = self.users.create_user(username).await?;
        info!(user = %user.id, username, "user registered");
        Ok(user)
    }

    pub async fn get(&self, id: UserId) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn by_username(&self, username: &str) -> Result<User> {
        self.users
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }
}
