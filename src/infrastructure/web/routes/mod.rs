pub mod enrollments;
pub mod events;
mod health_check;

pub use health_check::*;
