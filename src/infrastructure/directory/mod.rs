pub mod http;
pub mod inmemory;

use async_trait::async_trait;
use std::{error::Error, fmt::Debug};

use crate::domain::models::directory::{Member, Role};

/// The external directory that owns roles and members. Fetches report an
/// unknown id as `Ok(None)` so callers can tell "not there" apart from a
/// failed call.
#[async_trait]
pub trait Directory: Debug + Send + Sync {
    async fn create_role(
        &self,
        name: &str,
        reason: &str,
    ) -> Result<Role, Box<dyn Error + Send + Sync>>;
    async fn delete_role(
        &self,
        role_id: &str,
        reason: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
    async fn fetch_role(
        &self,
        role_id: &str,
    ) -> Result<Option<Role>, Box<dyn Error + Send + Sync>>;
    async fn fetch_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Member>, Box<dyn Error + Send + Sync>>;
    async fn assign_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
    async fn remove_role(
        &self,
        member: &Member,
        role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
