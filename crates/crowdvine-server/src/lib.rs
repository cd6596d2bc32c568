//! Crowdvine storefront edge server
//!
//! Library half of the `crowdvine-server` binary: configuration loading,
//! application state and the HTTP router. Integration tests drive the
//! router directly.

pub mod app;
pub mod config;
pub mod routes;
pub mod watcher;

pub use app::AppState;
pub use config::ServerConfig;
pub use routes::router;
