pub mod availability;
pub mod booking;
pub mod config;
pub mod display;
pub mod holidaze;
pub mod session;
pub mod tracing;
