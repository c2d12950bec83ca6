//! Core library surface for the Client Roster TUI application.
//!
//! `sort` is the multi-key sort engine behind the table's sort dropdown and
//! has no terminal dependencies. The remaining modules are the host around
//! it: persistence, configuration, logging and the ratatui front end.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod sort;
pub mod ui;

/// Startup configuration and the log subscriber, used by `main.rs`.
pub use config::{AppConfig, ConfigError};
pub use logging::init_logging;

/// Convenience re-exports for the persistence layer.
pub use db::{ensure_schema, fetch_clients, load_or_seed_clients};

/// The domain types that other layers manipulate.
pub use models::{Client, ClientStatus, ClientTab, ClientType};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
