pub mod directory;
pub mod event_record;
