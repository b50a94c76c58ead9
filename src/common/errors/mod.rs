use std::{error::Error, fmt::Display};

#[derive(Debug)]
pub struct EventRecordAlreadyExistsError {
    pub message: String,
}

impl EventRecordAlreadyExistsError {
    pub fn new(event_id: String) -> Self {
        Self {
            message: format!("Event record for event: {:?} already exists", event_id),
        }
    }
}

impl Display for EventRecordAlreadyExistsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for EventRecordAlreadyExistsError {}
