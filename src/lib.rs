pub mod api;
pub mod config;
pub mod optimizer;
pub mod payload;
pub mod telemetry;
