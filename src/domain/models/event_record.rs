use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted mapping between a scheduled event and the role created for it.
/// Its presence is what makes an event "ready" for the enrollment queue.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct EventRoleRecord {
    pub id: Uuid,
    pub event_id: String,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
}

impl EventRoleRecord {
    pub fn new(event_id: String, role_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            role_id,
            created_at: Utc::now(),
        }
    }
}
