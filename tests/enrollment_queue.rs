use std::error::Error;
use std::sync::Arc;

use actix_web::web::Data;
use async_trait::async_trait;
use rostra::application::queue_service::enrollment_queue::EnrollmentQueue;
use rostra::common::configuration::QueueSettings;
use rostra::domain::models::directory::{Member, Role};
use rostra::infrastructure::directory::inmemory::InMemoryDirectory;
use rostra::infrastructure::directory::Directory;
use rostra::infrastructure::persistence::inmemory::InMemoryDatabase;
use rostra::infrastructure::persistence::Database;
use tokio::sync::Notify;

struct TestQueue {
    queue: EnrollmentQueue,
    database: Arc<InMemoryDatabase>,
    directory: Arc<InMemoryDirectory>,
}

fn test_queue() -> TestQueue {
    let database = Arc::new(InMemoryDatabase::default());
    let directory = Arc::new(InMemoryDirectory::default());
    let queue = EnrollmentQueue::new(
        Data::from(Arc::clone(&database) as Arc<dyn Database>),
        Data::from(Arc::clone(&directory) as Arc<dyn Directory>),
        QueueSettings::default(),
    );
    TestQueue {
        queue,
        database,
        directory,
    }
}

async fn member(directory: &InMemoryDirectory, user_id: &str) {
    directory
        .insert_member(Member {
            id: user_id.to_string(),
            display_name: format!("Member {}", user_id),
        })
        .await;
}

#[tokio::test]
async fn attempts_count_up_while_the_event_record_is_missing() {
    let app = test_queue();
    app.queue.queue_enrollment("E1", "U1").await;

    app.queue.process_queues().await;

    let pending = app.queue.pending_for_event("E1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 1);
}

#[tokio::test]
async fn enrollment_is_dropped_after_max_attempts() {
    let app = test_queue();
    app.queue.queue_enrollment("E1", "U1").await;

    for _ in 0..5 {
        app.queue.process_queues().await;
    }
    assert!(app.queue.pending_for_event("E1").await.is_empty());

    // The emptied queue itself is garbage collected on the next pass
    app.queue.process_queues().await;
    assert!(app.queue.queued_events().await.is_empty());
}

#[tokio::test]
async fn removing_a_missing_enrollment_is_a_no_op() {
    let app = test_queue();
    app.queue.remove_enrollment("E1", "U1").await;
    assert!(app.queue.queued_events().await.is_empty());

    app.queue.queue_enrollment("E1", "U1").await;
    app.queue.remove_enrollment("E1", "U2").await;

    let pending = app.queue.pending_for_event("E1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, "U1");
}

#[tokio::test]
async fn duplicate_enrollments_are_ignored() {
    let app = test_queue();
    app.queue.queue_enrollment("E1", "U1").await;
    app.queue.queue_enrollment("E1", "U1").await;

    assert_eq!(app.queue.pending_for_event("E1").await.len(), 1);
}

#[tokio::test]
async fn clear_removes_every_enrollment_regardless_of_attempts() {
    let app = test_queue();
    app.queue.queue_enrollment("E1", "U1").await;
    app.queue.queue_enrollment("E1", "U2").await;
    app.queue.process_queues().await;

    app.queue.clear_event_queue("E1").await;
    assert!(app.queue.queued_events().await.is_empty());

    app.queue.process_queues().await;
    assert!(app.queue.queued_events().await.is_empty());
}

#[tokio::test]
async fn successful_assignment_removes_only_that_enrollment() {
    let app = test_queue();
    let role = app
        .directory
        .create_role("Event role", "test")
        .await
        .expect("Failed to create role");
    app.database
        .create_event_record("E1", &role.id)
        .await
        .expect("Failed to create event record");
    member(&app.directory, "U1").await;
    // U2 has no member entry, so their resolution fails softly

    app.queue.queue_enrollment("E1", "U1").await;
    app.queue.queue_enrollment("E1", "U2").await;
    app.queue.process_queues().await;

    let pending = app.queue.pending_for_event("E1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, "U2");
    assert!(app.directory.member_roles("U1").await.contains(&role.id));
}

#[tokio::test]
async fn resolution_failures_do_not_count_against_attempts() {
    let app = test_queue();
    let role = app
        .directory
        .create_role("Event role", "test")
        .await
        .expect("Failed to create role");
    app.database
        .create_event_record("E1", &role.id)
        .await
        .expect("Failed to create event record");
    // No member entry for U1: the enrollment stays queued indefinitely
    app.queue.queue_enrollment("E1", "U1").await;

    for _ in 0..10 {
        app.queue.process_queues().await;
    }

    let pending = app.queue.pending_for_event("E1").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 0);
}

#[tokio::test]
async fn enrollment_is_fulfilled_once_the_record_appears() {
    let app = test_queue();
    app.queue.queue_enrollment("E1", "U1").await;

    app.queue.process_queues().await;
    app.queue.process_queues().await;
    assert_eq!(app.queue.pending_for_event("E1").await[0].attempts, 2);

    let role = app
        .directory
        .create_role("Event role", "test")
        .await
        .expect("Failed to create role");
    app.database
        .create_event_record("E1", &role.id)
        .await
        .expect("Failed to create event record");
    member(&app.directory, "U1").await;

    app.queue.process_queues().await;

    assert!(app.queue.pending_for_event("E1").await.is_empty());
    assert!(app.directory.member_roles("U1").await.contains(&role.id));
}

/// Directory that parks the drain pass inside `fetch_role` until released,
/// so a second trigger can be fired while the first pass is mid-flight.
#[derive(Debug, Default)]
struct GatedDirectory {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl Directory for GatedDirectory {
    async fn create_role(
        &self,
        name: &str,
        _reason: &str,
    ) -> Result<Role, Box<dyn Error + Send + Sync>> {
        Ok(Role {
            id: "gated-role".to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_role(
        &self,
        _role_id: &str,
        _reason: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    async fn fetch_role(
        &self,
        role_id: &str,
    ) -> Result<Option<Role>, Box<dyn Error + Send + Sync>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Some(Role {
            id: role_id.to_string(),
            name: "Gated role".to_string(),
        }))
    }

    async fn fetch_member(
        &self,
        user_id: &str,
    ) -> Result<Option<Member>, Box<dyn Error + Send + Sync>> {
        Ok(Some(Member {
            id: user_id.to_string(),
            display_name: format!("Member {}", user_id),
        }))
    }

    async fn assign_role(
        &self,
        _member: &Member,
        _role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }

    async fn remove_role(
        &self,
        _member: &Member,
        _role: &Role,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[tokio::test]
async fn overlapping_drain_triggers_are_dropped() {
    let database = Arc::new(InMemoryDatabase::default());
    let directory = Arc::new(GatedDirectory::default());
    let queue = Arc::new(EnrollmentQueue::new(
        Data::from(Arc::clone(&database) as Arc<dyn Database>),
        Data::from(Arc::clone(&directory) as Arc<dyn Directory>),
        QueueSettings::default(),
    ));

    database
        .create_event_record("ready-event", "gated-role")
        .await
        .expect("Failed to create event record");
    queue.queue_enrollment("ready-event", "U1").await;

    let first_pass = tokio::spawn({
        let queue = Arc::clone(&queue);
        async move { queue.process_queues().await }
    });
    // Wait until the first pass is parked inside the directory call
    directory.entered.notified().await;

    // This enrollment has no event record; a pass that saw it would count an
    // attempt against it
    queue.queue_enrollment("late-event", "U2").await;
    queue.process_queues().await;

    let pending = queue.pending_for_event("late-event").await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 0);

    directory.release.notify_one();
    first_pass.await.expect("First drain pass panicked");
    assert!(queue.pending_for_event("ready-event").await.is_empty());
}
