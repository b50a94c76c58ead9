pub mod enrollment_queue;
