pub mod categories;
pub mod config;
pub mod error;
pub mod forms;
pub mod listings;
pub mod telemetry;
