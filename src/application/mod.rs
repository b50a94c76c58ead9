pub mod event_service;
pub mod queue_service;
