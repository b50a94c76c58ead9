use std::collections::HashMap;
use std::error::Error;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::common::errors::EventRecordAlreadyExistsError;
use crate::domain::models::event_record::EventRoleRecord;

use super::{Database, DeleteDataResponse, InsertDataResponse};

#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    event_records: Mutex<HashMap<String, EventRoleRecord>>,
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn create_event_record(
        &self,
        event_id: &str,
        role_id: &str,
    ) -> Result<InsertDataResponse, Box<dyn Error + Send + Sync>> {
        let mut records_lock = self.event_records.lock().await;
        match records_lock.get::<String>(&event_id.to_string()) {
            Some(_) => Err(Box::new(EventRecordAlreadyExistsError::new(
                event_id.to_string(),
            ))),
            None => {
                let record = EventRoleRecord::new(event_id.to_string(), role_id.to_string());
                records_lock.insert(record.event_id.clone(), record);
                Ok(InsertDataResponse::InMemory)
            }
        }
    }

    async fn find_event_record(
        &self,
        event_id: &str,
    ) -> Result<Option<EventRoleRecord>, Box<dyn Error + Send + Sync>> {
        let records_lock = self.event_records.lock().await;
        Ok(records_lock.get(event_id).cloned())
    }

    async fn delete_event_record(
        &self,
        event_id: &str,
    ) -> Result<DeleteDataResponse, Box<dyn Error + Send + Sync>> {
        let mut records_lock = self.event_records.lock().await;
        match records_lock.remove(event_id) {
            Some(_) => Ok(DeleteDataResponse::InMemory(1)),
            None => Ok(DeleteDataResponse::InMemory(0)),
        }
    }
}
