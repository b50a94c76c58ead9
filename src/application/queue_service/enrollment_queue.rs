use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actix_web::web;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::common::configuration::QueueSettings;
use crate::domain::models::event_record::EventRoleRecord;
use crate::infrastructure::directory::Directory;
use crate::infrastructure::persistence::Database;

/// One user waiting for the role of one scheduled event.
#[derive(Debug, Clone)]
pub struct PendingEnrollment {
    pub event_id: String,
    pub user_id: String,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl PendingEnrollment {
    fn new(event_id: &str, user_id: &str, max_attempts: u32) -> Self {
        Self {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            attempts: 0,
            max_attempts,
        }
    }
}

/// This queue processes the assignment of event roles to users that enrolled
/// into a scheduled event. Enrollment notifications and the persisted event
/// record can arrive in either order, so each pending enrollment is retried
/// until the record shows up and the directory accepts the assignment.
#[derive(Debug)]
pub struct EnrollmentQueue {
    queues: Mutex<HashMap<String, Vec<PendingEnrollment>>>,
    // Single-flight guard: a drain trigger arriving while a pass runs is
    // dropped, not queued.
    draining: AtomicBool,
    ready: Notify,
    database: web::Data<dyn Database>,
    directory: web::Data<dyn Directory>,
    settings: QueueSettings,
}

/// Handle to the background drain task. Dropping it stops the task; `stop`
/// waits for the task to finish the pass it may be in.
#[derive(Debug)]
pub struct DrainLoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DrainLoopHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl EnrollmentQueue {
    pub fn new(
        database: web::Data<dyn Database>,
        directory: web::Data<dyn Directory>,
        settings: QueueSettings,
    ) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            draining: AtomicBool::new(false),
            ready: Notify::new(),
            database,
            directory,
            settings,
        }
    }

    /// Spawns the periodic drain task. The task also wakes up whenever
    /// `mark_event_ready` is called and exits on shutdown.
    pub fn start_drain_loop(self: &Arc<Self>) -> DrainLoopHandle {
        let (shutdown, mut shutdown_signal) = watch::channel(false);
        let queue = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(queue.settings.drain_interval());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = queue.ready.notified() => {}
                    _ = shutdown_signal.changed() => {
                        tracing::info!("Enrollment queue drain loop stopping");
                        break;
                    }
                }
                queue.process_queues().await;
            }
        });
        DrainLoopHandle { shutdown, task }
    }

    /// Adds a user enrollment to the processing queue. At most one pending
    /// enrollment is kept per (event, user) pair.
    pub async fn queue_enrollment(&self, event_id: &str, user_id: &str) {
        let mut queues_lock = self.queues.lock().await;
        let queue = queues_lock.entry(event_id.to_string()).or_default();
        if queue.iter().any(|item| item.user_id == user_id) {
            tracing::info!(
                "User {} is already pending for scheduled event {}; ignoring duplicate enrollment",
                user_id,
                event_id
            );
            return;
        }
        queue.push(PendingEnrollment::new(
            event_id,
            user_id,
            self.settings.max_attempts,
        ));
        tracing::info!(
            "Queued enrollment for user {} for scheduled event {}",
            user_id,
            event_id
        );
    }

    /// Removes a user's pending enrollment, if any. Unknown events and users
    /// are informational no-ops.
    pub async fn remove_enrollment(&self, event_id: &str, user_id: &str) {
        let mut queues_lock = self.queues.lock().await;
        let Some(queue) = queues_lock.get_mut(event_id) else {
            tracing::info!(
                "There was no enrollment queue for scheduled event {}",
                event_id
            );
            return;
        };
        let before = queue.len();
        queue.retain(|item| item.user_id != user_id);
        let removed = queue.len() < before;
        let emptied = queue.is_empty();
        if removed {
            tracing::info!(
                "Removed pending enrollment for user {} from the queue for scheduled event {}",
                user_id,
                event_id
            );
            if emptied {
                queues_lock.remove(event_id);
            }
        } else {
            tracing::info!(
                "User {} had no pending enrollment for scheduled event {}",
                user_id,
                event_id
            );
        }
    }

    /// Clears all pending enrollments for an event, regardless of their
    /// attempt counts. Used when an event completes or is deleted.
    pub async fn clear_event_queue(&self, event_id: &str) {
        let mut queues_lock = self.queues.lock().await;
        match queues_lock.remove(event_id) {
            Some(queue) => tracing::info!(
                "Cleared {} pending enrollments for scheduled event {}",
                queue.len(),
                event_id
            ),
            None => tracing::info!(
                "There was no enrollment queue for scheduled event {}",
                event_id
            ),
        }
    }

    /// Requests an out-of-band drain pass without blocking the caller. The
    /// wakeup coalesces with any pass already in flight.
    pub fn mark_event_ready(&self, event_id: &str) {
        tracing::info!(
            "Scheduled event {} marked ready for enrollment processing",
            event_id
        );
        self.ready.notify_one();
    }

    /// Runs one drain pass over every event queue. At most one pass is active
    /// at a time; concurrent triggers return immediately.
    pub async fn process_queues(&self) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("A drain pass is already running; dropping this trigger");
            return;
        }
        if let Err(error) = self.drain_pass().await {
            tracing::warn!("Failed to process a scheduled event in the enrollment queue");
            tracing::error!("{}", error);
        }
        self.draining.store(false, Ordering::Release);
    }

    async fn drain_pass(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let event_ids: Vec<String> = {
            let queues_lock = self.queues.lock().await;
            queues_lock.keys().cloned().collect()
        };
        for event_id in event_ids {
            {
                let mut queues_lock = self.queues.lock().await;
                match queues_lock.get(&event_id).map(Vec::is_empty) {
                    // Cleared while this pass was working on other events
                    None => continue,
                    Some(true) => {
                        queues_lock.remove(&event_id);
                        continue;
                    }
                    Some(false) => {}
                }
            }
            match self.database.find_event_record(&event_id).await? {
                None => self.record_missed_attempt(&event_id).await,
                Some(record) => self.assign_pending_roles(&event_id, &record).await,
            }
        }
        Ok(())
    }

    /// The event record is not persisted yet: count an attempt against every
    /// pending enrollment and drop the ones that hit their limit.
    async fn record_missed_attempt(&self, event_id: &str) {
        let mut queues_lock = self.queues.lock().await;
        let Some(queue) = queues_lock.get_mut(event_id) else {
            return;
        };
        for item in queue.iter_mut() {
            item.attempts += 1;
        }
        // TODO: Dropped enrollments only survive in the logs; record them
        // somewhere queryable so the role can still be granted by hand.
        queue.retain(|item| {
            if item.attempts >= item.max_attempts {
                tracing::error!(
                    "No event record appeared for scheduled event {} after {} attempts; removing user {} from the enrollment queue",
                    event_id,
                    item.attempts,
                    item.user_id
                );
                false
            } else {
                true
            }
        });
    }

    /// The event record exists: try to resolve and assign the role for every
    /// pending enrollment. Resolution and assignment failures leave the item
    /// queued without touching its attempt count, since they concern external
    /// state that is expected to catch up on its own.
    async fn assign_pending_roles(&self, event_id: &str, record: &EventRoleRecord) {
        let pending_users: Vec<String> = {
            let queues_lock = self.queues.lock().await;
            match queues_lock.get(event_id) {
                Some(queue) => queue.iter().map(|item| item.user_id.clone()).collect(),
                None => return,
            }
        };

        for user_id in pending_users {
            // The item may have been removed or the queue cleared while a
            // previous iteration was awaiting the directory.
            if !self.is_pending(event_id, &user_id).await {
                continue;
            }

            let role = match self.directory.fetch_role(&record.role_id).await {
                Ok(Some(role)) => role,
                Ok(None) => {
                    tracing::error!(
                        "Failed to find role {} associated with scheduled event {}. Cannot proceed with enrollment for user {}",
                        record.role_id,
                        event_id,
                        user_id
                    );
                    continue;
                }
                Err(error) => {
                    tracing::error!(
                        "Failed to fetch role {} for scheduled event {}: {}",
                        record.role_id,
                        event_id,
                        error
                    );
                    continue;
                }
            };

            let member = match self.directory.fetch_member(&user_id).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    tracing::error!(
                        "Failed to find member for user {} enrolled in scheduled event {}. Cannot proceed with enrollment",
                        user_id,
                        event_id
                    );
                    continue;
                }
                Err(error) => {
                    tracing::error!(
                        "Failed to fetch member for user {} enrolled in scheduled event {}: {}",
                        user_id,
                        event_id,
                        error
                    );
                    continue;
                }
            };

            match self.directory.assign_role(&member, &role).await {
                Ok(()) => {
                    tracing::info!(
                        "Assigned role {} to member {}. Removing them from the enrollment queue",
                        role.name,
                        member.display_name
                    );
                    self.remove_fulfilled(event_id, &user_id).await;
                }
                Err(error) => {
                    tracing::error!(
                        "Failed to assign role {} to member {}: {}",
                        role.name,
                        member.display_name,
                        error
                    );
                }
            }
        }
    }

    async fn is_pending(&self, event_id: &str, user_id: &str) -> bool {
        let queues_lock = self.queues.lock().await;
        queues_lock
            .get(event_id)
            .map_or(false, |queue| queue.iter().any(|item| item.user_id == user_id))
    }

    async fn remove_fulfilled(&self, event_id: &str, user_id: &str) {
        let mut queues_lock = self.queues.lock().await;
        let emptied = match queues_lock.get_mut(event_id) {
            Some(queue) => {
                queue.retain(|item| item.user_id != user_id);
                queue.is_empty()
            }
            None => false,
        };
        if emptied {
            queues_lock.remove(event_id);
        }
    }

    /// Snapshot of the pending enrollments for one event.
    pub async fn pending_for_event(&self, event_id: &str) -> Vec<PendingEnrollment> {
        let queues_lock = self.queues.lock().await;
        queues_lock.get(event_id).cloned().unwrap_or_default()
    }

    /// Event ids that currently have a queue.
    pub async fn queued_events(&self) -> Vec<String> {
        let queues_lock = self.queues.lock().await;
        queues_lock.keys().cloned().collect()
    }
}
