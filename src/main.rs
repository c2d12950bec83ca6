//! Binary entry point: resolve configuration, start logging, bring up the
//! database, and drive the Ratatui event loop until the user exits.
use anyhow::Context;
use client_roster::sort::client_fields;
use client_roster::{ensure_schema, init_logging, load_or_seed_clients, run_app, App, AppConfig};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_logging(&config)?;
    info!(data_dir = %config.data_dir.display(), "starting client roster");

    let conn = ensure_schema(&config.db_path)?;
    let clients = load_or_seed_clients(&conn)?;
    let registry = client_fields().context("invalid sort field registry")?;

    let mut app = App::new(conn, registry, clients)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %err, "client roster exited with an error");
    }
    result
}
