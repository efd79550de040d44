//! HTTP handlers for the interpret service.

pub mod health;
pub mod interpret;
pub mod metrics;
