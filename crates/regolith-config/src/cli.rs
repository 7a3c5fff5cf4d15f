//! Command-line argument parsing for the Regolith runner.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Regolith command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "regolith", about = "Regolith headless simulation runner")]
pub struct CliArgs {
    /// World-generation seed.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Streaming window radius in chunks.
    #[arg(long)]
    pub chunk_radius: Option<i32>,

    /// Ticks between autosaves (0 disables autosave).
    #[arg(long)]
    pub autosave_interval: Option<u64>,

    /// Directory save files are written to.
    #[arg(long)]
    pub save_dir: Option<String>,

    /// Log filter (e.g. "info", "regolith_sim=debug").
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of ticks to run before exiting.
    #[arg(long, default_value_t = 600)]
    pub ticks: u64,

    /// Ignore any existing save and start a fresh world.
    #[arg(long)]
    pub fresh: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.sim.seed = seed;
        }
        if let Some(radius) = args.chunk_radius {
            self.sim.chunk_radius = radius;
        }
        if let Some(interval) = args.autosave_interval {
            self.storage.autosave_interval_ticks = interval;
        }
        if let Some(ref dir) = args.save_dir {
            self.storage.save_dir = dir.clone();
        }
        if let Some(ref filter) = args.log_filter {
            self.log_filter = filter.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(9001),
            save_dir: Some("/tmp/regolith".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.sim.seed, 9001);
        assert_eq!(config.storage.save_dir, "/tmp/regolith");
        // Non-overridden fields retain defaults
        assert_eq!(config.sim.chunk_radius, 2);
        assert_eq!(config.storage.autosave_interval_ticks, 300);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }
}
