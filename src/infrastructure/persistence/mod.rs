pub mod inmemory;
pub mod postgres;

use async_trait::async_trait;
use std::{error::Error, fmt::Debug};

use crate::domain::models::event_record::EventRoleRecord;

/// Store for the event to role mappings the drain loop depends on. The queue
/// treats an absent record as "not ready yet", never as an error.
#[async_trait]
pub trait Database: Debug + Send + Sync {
    async fn create_event_record(
        &self,
        event_id: &str,
        role_id: &str,
    ) -> Result<InsertDataResponse, Box<dyn Error + Send + Sync>>;
    async fn find_event_record(
        &self,
        event_id: &str,
    ) -> Result<Option<EventRoleRecord>, Box<dyn Error + Send + Sync>>;
    async fn delete_event_record(
        &self,
        event_id: &str,
    ) -> Result<DeleteDataResponse, Box<dyn Error + Send + Sync>>;
}

pub enum InsertDataResponse {
    InMemory,
    Postgres(u64),
}

pub enum DeleteDataResponse {
    InMemory(u64),
    Postgres(u64),
}

impl DeleteDataResponse {
    pub fn rows_affected(&self) -> u64 {
        match self {
            DeleteDataResponse::InMemory(rows) => *rows,
            DeleteDataResponse::Postgres(rows) => *rows,
        }
    }
}
