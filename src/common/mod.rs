pub mod configuration;
pub mod errors;
pub mod helpers;
pub mod telemetry;
pub mod types;
