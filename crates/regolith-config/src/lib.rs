//! Runtime configuration: RON on disk, defaults in one place.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, SimConfig, StorageConfig};
pub use error::ConfigError;
