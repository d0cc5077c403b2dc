use async_trait::async_trait;
use chrono::Utc;
use domains::{
    Community, CommunityId, CommunityRepo, CommunityType, DomainError, ModerationLog, NewLogEntry,
    Result, StaffRole, UserId,
};

use super::InMemoryStore;

#[async_trait]
impl CommunityRepo for InMemoryStore {
    async fn create_community(&self, name: &str, kind: CommunityType, creator: UserId) -> Result<Community> {
        let mut t = self.tables.write().await;
        if t.communities.values().any(|c| c.name == name) {
            return Err(DomainError::Conflict(format!("community {name} already exists")));
        }
        let id = CommunityId(t.next_id());
        let community = Community { id, name: name.to_string(), kind, creator, created_at: Utc::now() };
        t.communities.insert(id, community.clone());
        t.members.insert((id, creator));
        Ok(community)
    }

    async fn get_community(&self, id: CommunityId) -> Result<Option<Community>> {
        Ok(self.tables.read().await.communities.get(&id).cloned())
    }

    async fn find_community_by_name(&self, name: &str) -> Result<Option<Community>> {
        let t = self.tables.read().await;
        Ok(t.communities.values().find(|c| c.name == name).cloned())
    }

    async fn is_member(&self, user: UserId, community: CommunityId) -> Result<bool> {
        Ok(self.tables.read().await.members.contains(&(community, user)))
    }

    async fn add_member(&self, user: UserId, community: CommunityId) -> Result<()> {
        let mut t = self.tables.write().await;
        t.members.insert((community, user));
        t.invites.remove(&(community, user));
        Ok(())
    }

    async fn remove_member(&self, user: UserId, community: CommunityId) -> Result<()> {
        let mut t = self.tables.write().await;
        t.members.remove(&(community, user));
        t.roles.remove(&(community, user));
        Ok(())
    }

    async fn stored_role(&self, user: UserId, community: CommunityId) -> Result<StaffRole> {
        let t = self.tables.read().await;
        Ok(t.roles.get(&(community, user)).copied().unwrap_or_default())
    }

    async fn set_role(&self, user: UserId, community: CommunityId, role: StaffRole, log: NewLogEntry) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check_log(Some(&log))?;
        match role {
            StaffRole::None => t.roles.remove(&(community, user)),
            role => t.roles.insert((community, user), role),
        };
        t.append_log(log);
        Ok(())
    }

    async fn is_banned(&self, user: UserId, community: CommunityId) -> Result<bool> {
        Ok(self.tables.read().await.bans.contains(&(community, user)))
    }

    async fn ban(&self, user: UserId, community: CommunityId, log: NewLogEntry) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check_log(Some(&log))?;
        t.bans.insert((community, user));
        t.members.remove(&(community, user));
        t.roles.remove(&(community, user));
        t.invites.remove(&(community, user));
        t.append_log(log);
        Ok(())
    }

    async fn unban(&self, user: UserId, community: CommunityId, log: NewLogEntry) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check_log(Some(&log))?;
        t.bans.remove(&(community, user));
        t.append_log(log);
        Ok(())
    }

    async fn insert_invite(&self, inviter: UserId, invitee: UserId, community: CommunityId) -> Result<()> {
        self.tables.write().await.invites.insert((community, invitee), inviter);
        Ok(())
    }

    async fn has_invite(&self, invitee: UserId, community: CommunityId) -> Result<bool> {
        Ok(self.tables.read().await.invites.contains_key(&(community, invitee)))
    }

    async fn list_logs(&self, community: CommunityId) -> Result<Vec<ModerationLog>> {
        let t = self.tables.read().await;
        Ok(t.logs
            .iter()
            .rev()
            .filter(|entry| entry.community == community)
            .cloned()
            .collect())
    }
}
