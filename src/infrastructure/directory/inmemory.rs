use std::collections::{HashMap, HashSet};
use std::error::Error;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::directory::{Member, Role};

use super::Directory;

/// In-process directory used in tests and local runs. Role assignments are
/// kept per member id.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    roles: Mutex<HashMap<String, Role>>,
    members: Mutex<HashMap<String, Member>>,
    assignments: Mutex<HashMap<String, HashSet<String>>>,
}

impl InMemoryDirectory {
    pub async fn insert_member(&self, member: Member) {
        let mut members_lock = self.members.lock().await;
        members_lock.insert(member.id.clone(), member);
    }

    pub async fn member_roles(&self, user_id: &str) -> HashSet<String> {
        let assignments_lock = self.assignments.lock().await;
        assignments_lock.get(user_id).cloned().unwrap_or_default()
    }

    pub async fn role_count(&self) -> usize {
        let roles_lock = self.roles.lock().await;
        roles_lock.len()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn create_role(
        &self,
        name: &str,
        _reason: &str,
    ) -> Result<Role, Box<dyn Error + Send + Sync>> {
        let role = Role {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        let mut roles_lock = self.roles.lock().await;
        roles_lock.insert(role.id.clone(), role.clone());
        Ok(role)
    }

    async fn delete_role(
        &self,
        role_id: &str,
        _reason: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut roles_lock = self.roles.lock().await;
        roles_lock.remove(role_id);
        let mut assignments_lock = self.assignments.lock().await;
        for held_roles in assignments_lock.values_mut() {
            held_roles.remove(role_id);
        }
        Ok(())
    }

    async fn fetch_role(
        &self,
        role_id: &str,
    ) -> Result<Option<Role>, Box<dyn Error + Send + Sync>> {
        let roles_lock = self.roles.lock().await;
        Ok(roles_lock.get(role_id).cloned())
    }

    async fn fetch_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Member>, Box<dyn Error + Send + Sync>> {
        let members_lock = self.members.lock().await;
        Ok(members_lock.get(user_id).cloned())
    }

    async fn assign_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut assignments_lock = self.assignments.lock().await;
        assignments_lock
            .entry(member.id.clone())
            .or_default()
            .insert(role.id.clone());
        Ok(())
    }

    async fn remove_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        // Removing a role the member does not hold is not an error, matching
        // the platform behaviour the bot relied on.
        let mut assignments_lock = self.assignments.lock().await;
        if let Some(held_roles) = assignments_lock.get_mut(&member.id) {
            held_roles.remove(&role.id);
        }
        Ok(())
    }
}
