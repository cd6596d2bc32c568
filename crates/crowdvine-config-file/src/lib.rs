//! File-based settings store for Crowdvine deployments
//!
//! This crate implements the `SettingsStore` trait using a YAML or TOML file
//! on disk. It's meant for local and single-node deployments where the
//! runtime-adjustable storefront settings live next to the server.
//!
//! # Features
//! - YAML (default) and TOML (by extension) settings files
//! - Real-time file watching with `notify`
//! - Top-level object validation on load
//!
//! # Example
//! ```no_run
//! # use crowdvine_config_file::FileSettingsStore;
//! # use crowdvine_core::SettingsStore;
//! # async fn example() -> crowdvine_core::Result<()> {
//! let store = FileSettingsStore::new("~/.crowdvine/settings.yaml").await?;
//! let threshold = store.get_setting("few_left_threshold").await?;
//! # Ok(())
//! # }
//! ```

mod file_store;

pub use file_store::FileSettingsStore;
