//! Persistence module split across logical submodules.

mod clients;
mod connection;

pub use clients::{fetch_clients, load_or_seed_clients, seed_clients};
pub use connection::{ensure_schema, open_in_memory};
