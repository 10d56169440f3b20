//! Configuration management for bookgate

pub mod loader;
mod schema;

pub use loader::{load_config, load_config_from_path, CONFIG_FILENAME};
pub use schema::*;
