use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, Utc};

use crate::application::queue_service::enrollment_queue::EnrollmentQueue;
use crate::common::helpers::reasonable_truncate;
use crate::common::types::{EnrollmentNotice, ScheduledEventNotice};
use crate::infrastructure::directory::Directory;
use crate::infrastructure::persistence::Database;

/// Handles the lifecycle of a scheduled event around the enrollment queue:
/// creating the event role and its record, and tearing both down when the
/// event completes or is deleted.
#[derive(Debug)]
pub struct EventService {
    database: web::Data<dyn Database>,
    directory: web::Data<dyn Directory>,
    enrollment_queue: Arc<EnrollmentQueue>,
}

impl EventService {
    pub fn new(
        database: web::Data<dyn Database>,
        directory: web::Data<dyn Directory>,
        enrollment_queue: Arc<EnrollmentQueue>,
    ) -> Self {
        Self {
            database,
            directory,
            enrollment_queue,
        }
    }

    /// Processes a newly created scheduled event: creates its role, persists
    /// the event record, queues the creator and marks the event ready.
    /// Returns whether processing succeeded; failures are logged, never
    /// surfaced to the event source.
    pub async fn process_event(&self, event: &ScheduledEventNotice) -> bool {
        match self.try_process_event(event).await {
            Ok(processed) => processed,
            Err(error) => {
                tracing::warn!(
                    "Failed to process scheduled event {} in the event service",
                    event.name
                );
                tracing::error!("{}", error);
                false
            }
        }
    }

    async fn try_process_event(
        &self,
        event: &ScheduledEventNotice,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        if self
            .database
            .find_event_record(&event.event_id)
            .await?
            .is_some()
        {
            tracing::info!(
                "Scheduled event {} already has an event record. Skipping processing in the event service",
                event.name
            );
            return Ok(true);
        }

        let role = self
            .directory
            .create_role(
                &event_role_name(&event.name, event.start_time),
                &format!("Role for the scheduled event {}.", event.name),
            )
            .await?;
        tracing::info!(
            "Created role {} associated with scheduled event {}",
            role.name,
            event.name
        );

        if let Err(error) = self
            .database
            .create_event_record(&event.event_id, &role.id)
            .await
        {
            // The role outlives the failed record on purpose; a later retry
            // of the notification finds it via a fresh record.
            tracing::error!(
                "Failed to write scheduled event {} into the database: {}",
                event.name,
                error
            );
            return Ok(false);
        }
        tracing::info!(
            "Wrote scheduled event {} into the database. Marked it ready for the enrollment queue",
            event.name
        );

        if let Some(creator_id) = &event.creator_id {
            self.enrollment_queue
                .queue_enrollment(&event.event_id, creator_id)
                .await;
        }
        self.enrollment_queue.mark_event_ready(&event.event_id);
        Ok(true)
    }

    /// Catch-up sweep over events that may have been created while the
    /// service was down. Per-event failures are isolated.
    pub async fn batch_process_events(
        &self,
        events: &[ScheduledEventNotice],
    ) -> HashMap<String, bool> {
        let mut result = HashMap::new();
        for event in events {
            let processed = self.process_event(event).await;
            result.insert(event.event_id.clone(), processed);
        }
        result
    }

    /// Cleanup shared by the completed and deleted transitions: stop pending
    /// enrollments, delete the event role and remove the record.
    pub async fn retire_event(&self, event: &ScheduledEventNotice) -> bool {
        match self.try_retire_event(event).await {
            Ok(retired) => retired,
            Err(error) => {
                tracing::warn!(
                    "Failed to retire scheduled event {} in the event service",
                    event.name
                );
                tracing::error!("{}", error);
                false
            }
        }
    }

    async fn try_retire_event(
        &self,
        event: &ScheduledEventNotice,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.enrollment_queue.clear_event_queue(&event.event_id).await;

        let Some(record) = self.database.find_event_record(&event.event_id).await? else {
            tracing::error!(
                "Failed to find an event record for scheduled event {}. Cannot proceed with deleting the associated role",
                event.name
            );
            return Ok(false);
        };

        // The role may already be gone if someone deleted it by hand; the
        // record is removed either way.
        match self.directory.fetch_role(&record.role_id).await? {
            None => tracing::error!(
                "Failed to find role associated with scheduled event {}. Proceeding to delete the event record",
                event.name
            ),
            Some(role) => {
                let reason = format!(
                    "Deleted role associated with scheduled event {} that has ended.",
                    event.name
                );
                match self.directory.delete_role(&role.id, &reason).await {
                    Ok(()) => tracing::info!(
                        "Deleted role {} associated with scheduled event {}",
                        role.name,
                        event.name
                    ),
                    Err(error) => tracing::error!(
                        "Failed to delete role {} associated with scheduled event {}: {}",
                        role.name,
                        event.name,
                        error
                    ),
                }
            }
        }

        let delete_result = self.database.delete_event_record(&event.event_id).await?;
        if delete_result.rows_affected() > 0 {
            tracing::info!("Deleted event record for scheduled event {}", event.name);
            Ok(true)
        } else {
            tracing::warn!(
                "Failed to delete event record for scheduled event {}",
                event.name
            );
            Ok(false)
        }
    }

    /// A user left an event: drop their pending enrollment and revoke the
    /// role in case it was already assigned.
    pub async fn withdraw_user(&self, notice: &EnrollmentNotice) -> bool {
        match self.try_withdraw_user(notice).await {
            Ok(withdrawn) => withdrawn,
            Err(error) => {
                tracing::warn!(
                    "Failed to withdraw user {} from scheduled event {}",
                    notice.user_id,
                    notice.event_id
                );
                tracing::error!("{}", error);
                false
            }
        }
    }

    async fn try_withdraw_user(
        &self,
        notice: &EnrollmentNotice,
    ) -> Result<bool, Box<dyn Error + Send + Sync>> {
        self.enrollment_queue
            .remove_enrollment(&notice.event_id, &notice.user_id)
            .await;

        let Some(record) = self.database.find_event_record(&notice.event_id).await? else {
            tracing::info!(
                "No event record for scheduled event {}; nothing to revoke for user {}",
                notice.event_id,
                notice.user_id
            );
            return Ok(true);
        };
        let Some(role) = self.directory.fetch_role(&record.role_id).await? else {
            tracing::error!(
                "Failed to find role associated with scheduled event {}. Cannot proceed with removing the role from the member",
                notice.event_id
            );
            return Ok(false);
        };
        let Some(member) = self.directory.fetch_member(&notice.user_id).await? else {
            tracing::error!(
                "Failed to find member for user {}. Cannot proceed with removing the role",
                notice.user_id
            );
            return Ok(false);
        };

        // Revokes whether or not the member holds the role; checking first
        // would just be an extra directory call.
        self.directory.remove_role(&member, &role).await?;
        tracing::info!(
            "Removed role {} from member {}",
            role.name,
            member.display_name
        );
        Ok(true)
    }
}

/// Role names carry a truncated event name plus the scheduled start time.
fn event_role_name(event_name: &str, start_time: Option<DateTime<Utc>>) -> String {
    match start_time {
        Some(start) => format!(
            "{} [{}]",
            reasonable_truncate(event_name),
            start.format("%b-%d %H:%M")
        ),
        None => reasonable_truncate(event_name).to_string(),
    }
}
