//! Crowdvine Observability
//!
//! This crate provides observability features:
//! - Metrics collection (Prometheus)
//! - Health endpoints

pub mod health;
pub mod metrics;

pub use health::{HealthState, ReadinessChecker, StoreStatus, health_router};
pub use metrics::Metrics;
