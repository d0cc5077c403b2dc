//! # Community Membership Registry
//!
//! Community type, membership, staff roles, bans and invites.
//! The creator of a community is always an administrator.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    Community, CommunityId, CommunityRepo, CommunityType, DomainError, LogAction, ModerationLog,
    NewLogEntry, Result, StaffRole, UserId,
};
use tracing::info;

const COMMUNITY_NAME_MAX_LENGTH: usize = 32;

#[derive(Clone)]
pub struct CommunityRegistry {
    communities: Arc<dyn CommunityRepo>,
}

impl CommunityRegistry {
    pub fn new(communities: Arc<dyn CommunityRepo>) -> Self {
        Self { communities }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub async fn get(&self, id: CommunityId) -> Result<Community> {
        self.communities
            .get_community(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Community", id))
    }

    pub async fn by_name(&self, name: &str) -> Result<Community> {
        self.communities
            .find_community_by_name(name)
            .await?
            .ok_or_else(|| DomainError::not_found("Community", name))
    }

    pub async fn is_member(&self, user: UserId, community: CommunityId) -> Result<bool> {
        self.communities.is_member(user, community).await
    }

    pub async fn is_banned(&self, user: UserId, community: CommunityId) -> Result<bool> {
        self.communities.is_banned(user, community).await
    }

    pub async fn is_private(&self, community: CommunityId) -> Result<bool> {
        Ok(self.get(community).await?.is_private())
    }

    pub async fn staff_role(&self, user: UserId, community: CommunityId) -> Result<StaffRole> {
        let community = self.get(community).await?;
        self.role_in(user, &community).await
    }

    /// Role of `user` in an already loaded community.
    pub async fn role_in(&self, user: UserId, community: &Community) -> Result<StaffRole> {
        if community.creator == user {
            return Ok(StaffRole::Administrator);
        }
        self.communities.stored_role(user, community.id).await
    }

    pub async fn is_staff(&self, user: UserId, community: &Community) -> Result<bool> {
        Ok(self.role_in(user, community).await?.is_staff())
    }

    // ── Lifecycle & membership ──────────────────────────────────────────────

    /// Names are 1..=32 ASCII letters, digits or `_`, unique.
    pub async fn create_community(&self, creator: UserId, name: &str, kind: CommunityType) -> Result<Community> {
        let valid = !name.is_empty()
            && name.len() <= COMMUNITY_NAME_MAX_LENGTH
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(DomainError::Invalid(format!("invalid community name '{name}'")));
        }
        if self.communities.find_community_by_name(name).await?.is_some() {
            return Err(DomainError::Conflict(format!("community '{name}' already exists")));
        }

        let community = self.communities.create_community(name, kind, creator).await?;
        info!(community = %community.id, creator = %creator, ?kind, "community created");
        Ok(community)
    }

    pub async fn join(&self, user: UserId, community: CommunityId) -> Result<()> {
        let community = self.get(community).await?;
        if self.communities.is_banned(user, community.id).await? {
            return Err(DomainError::forbidden("user is banned from the community"));
        }
        if self.communities.is_member(user, community.id).await? {
            return Err(DomainError::Conflict("already a member".into()));
        }
        if community.is_private() && !self.communities.has_invite(user, community.id).await? {
            return Err(DomainError::forbidden("private community requires an invite"));
        }
        self.communities.add_member(user, community.id).await?;
        info!(user = %user, community = %community.id, "joined community");
        Ok(())
    }

    pub async fn leave(&self, user: UserId, community: CommunityId) -> Result<()> {
        let community = self.get(community).await?;
        if community.creator == user {
            return Err(DomainError::forbidden("the creator cannot leave the community"));
        }
        if !self.communities.is_member(user, community.id).await? {
            return Err(DomainError::not_found("Membership", user));
        }
        self.communities.remove_member(user, community.id).await
    }

    pub async fn invite(&self, inviter: UserId, invitee: UserId, community: CommunityId) -> Result<()> {
        let community = self.get(community).await?;
        if !self.communities.is_member(inviter, community.id).await? {
            return Err(DomainError::forbidden("only members can invite"));
        }
        if self.communities.is_member(invitee, community.id).await? {
            return Err(DomainError::Conflict("user is already a member".into()));
        }
        if self.communities.has_invite(invitee, community.id).await? {
            return Err(DomainError::Conflict("user is already invited".into()));
        }
        self.communities.insert_invite(inviter, invitee, community.id).await
    }

    // ── Moderation ──────────────────────────────────────────────────────────

    fn log(community: &Community, action: LogAction, source: UserId, target: UserId) -> NewLogEntry {
        NewLogEntry {
            community: community.id,
            action,
            source_user: source,
            target_user: target,
            post: None,
            created_at: Utc::now(),
        }
    }

    pub async fn ban(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        let community = self.get(community).await?;
        if actor == user {
            return Err(DomainError::Invalid("cannot ban oneself".into()));
        }
        if !self.is_staff(actor, &community).await? {
            return Err(DomainError::forbidden("staff role required"));
        }
        if self.is_staff(user, &community).await? {
            return Err(DomainError::forbidden("staff members cannot be banned"));
        }
        if self.communities.is_banned(user, community.id).await? {
            return Err(DomainError::Conflict("user is already banned".into()));
        }
        self.communities
            .ban(user, community.id, Self::log(&community, LogAction::Ban, actor, user))
            .await?;
        info!(actor = %actor, user = %user, community = %community.id, "user banned");
        Ok(())
    }

    pub async fn unban(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        let community = self.get(community).await?;
        if !self.is_staff(actor, &community).await? {
            return Err(DomainError::forbidden("staff role required"));
        }
        if !self.communities.is_banned(user, community.id).await? {
            return Err(DomainError::Conflict("user is not banned".into()));
        }
        self.communities
            .unban(user, community.id, Self::log(&community, LogAction::Unban, actor, user))
            .await?;
        info!(actor = %actor, user = %user, community = %community.id, "user unbanned");
        Ok(())
    }

    async fn change_role(
        &self,
        actor: UserId,
        user: UserId,
        community: CommunityId,
        action: LogAction,
    ) -> Result<()> {
        let community = self.get(community).await?;
        if self.role_in(actor, &community).await? != StaffRole::Administrator {
            return Err(DomainError::forbidden("administrator role required"));
        }
        if community.creator == user {
            return Err(DomainError::forbidden("the creator's role cannot change"));
        }
        if !self.communities.is_member(user, community.id).await? {
            return Err(DomainError::Invalid("user is not a member".into()));
        }

        let current = self.communities.stored_role(user, community.id).await?;
        let next = match (action, current) {
            (LogAction::AddAdministrator, StaffRole::Administrator) => {
                return Err(DomainError::Conflict("already an administrator".into()))
            }
            (LogAction::AddAdministrator, _) => StaffRole::Administrator,
            (LogAction::RemoveAdministrator, StaffRole::Administrator) => StaffRole::None,
            (LogAction::RemoveAdministrator, _) => {
                return Err(DomainError::Conflict("not an administrator".into()))
            }
            (LogAction::AddModerator, StaffRole::None) => StaffRole::Moderator,
            (LogAction::AddModerator, _) => {
                return Err(DomainError::Conflict("already a staff member".into()))
            }
            (LogAction::RemoveModerator, StaffRole::Moderator) => StaffRole::None,
            (LogAction::RemoveModerator, _) => {
                return Err(DomainError::Conflict("not a moderator".into()))
            }
            (other, _) => return Err(DomainError::Internal(format!("{other:?} is not a role change"))),
        };

        self.communities
            .set_role(user, community.id, next, Self::log(&community, action, actor, user))
            .await?;
        info!(actor = %actor, user = %user, community = %community.id, role = ?next, "staff role changed");
        Ok(())
    }

    pub async fn add_administrator(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        self.change_role(actor, user, community, LogAction::AddAdministrator).await
    }

    pub async fn remove_administrator(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        self.change_role(actor, user, community, LogAction::RemoveAdministrator).await
    }

    pub async fn add_moderator(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        self.change_role(actor, user, community, LogAction::AddModerator).await
    }

    pub async fn remove_moderator(&self, actor: UserId, user: UserId, community: CommunityId) -> Result<()> {
        self.change_role(actor, user, community, LogAction::RemoveModerator).await
    }

    /// Staff-only view of the moderation log.
    pub async fn logs(&self, actor: UserId, community: CommunityId) -> Result<Vec<ModerationLog>> {
        let community = self.get(community).await?;
        if !self.is_staff(actor, &community).await? {
            return Err(DomainError::forbidden("staff role required"));
        }
        self.communities.list_logs(community.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::MockCommunityRepo;

    fn community(kind: CommunityType) -> Community {
        Community {
            id: CommunityId(1),
            name: "rustaceans".into(),
            kind,
            creator: UserId(1),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_creator_is_administrator_without_stored_role() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_stored_role().never();

        let registry = CommunityRegistry::new(Arc::new(repo));
        let role = registry.role_in(UserId(1), &community(CommunityType::Public)).await.unwrap();
        assert_eq!(role, StaffRole::Administrator);
    }

    #[tokio::test]
    async fn test_cannot_join_private_community_without_invite() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_get_community()
            .returning(|_| Ok(Some(community(CommunityType::Private))));
        repo.expect_is_banned().returning(|_, _| Ok(false));
        repo.expect_is_member().returning(|_, _| Ok(false));
        repo.expect_has_invite().returning(|_, _| Ok(false));
        repo.expect_add_member().never();

        let registry = CommunityRegistry::new(Arc::new(repo));
        let err = registry.join(UserId(5), CommunityId(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_join() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_get_community()
            .returning(|_| Ok(Some(community(CommunityType::Public))));
        repo.expect_is_banned().returning(|_, _| Ok(true));
        repo.expect_add_member().never();

        let registry = CommunityRegistry::new(Arc::new(repo));
        assert!(registry.join(UserId(5), CommunityId(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_moderator_cannot_appoint_staff() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_get_community()
            .returning(|_| Ok(Some(community(CommunityType::Public))));
        repo.expect_stored_role().returning(|_, _| Ok(StaffRole::Moderator));
        repo.expect_set_role().never();

        let registry = CommunityRegistry::new(Arc::new(repo));
        let err = registry
            .add_moderator(UserId(2), UserId(3), CommunityId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_staff_cannot_be_banned() {
        let mut repo = MockCommunityRepo::new();
        repo.expect_get_community()
            .returning(|_| Ok(Some(community(CommunityType::Public))));
        repo.expect_stored_role().returning(|_, _| Ok(StaffRole::Moderator));
        repo.expect_ban().never();

        let registry = CommunityRegistry::new(Arc::new(repo));
        let err = registry.ban(UserId(1), UserId(3), CommunityId(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
