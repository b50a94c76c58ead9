use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification that a scheduled event was created, completed or deleted on
/// the platform. `start_time` and `creator_id` are only present on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEventNotice {
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub creator_id: Option<String>,
}

/// Notification that a user joined or left a scheduled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentNotice {
    pub event_id: String,
    pub user_id: String,
}
