use std::path::PathBuf;

use clap::{Parser, Subcommand};
use savekeeper_core::config::{ConfigError, SaveConfig};

#[derive(Parser, Debug)]
#[command(name = "savekeeper", version, about = "Player profile saves and leaderboards")]
pub struct Cli {
    /// Directory holding `<profile>_save.dat` files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read and write ciphered save files
    #[arg(long, global = true)]
    pub cipher: bool,

    /// Sync and verify every write
    #[arg(long, global = true)]
    pub durability_sync: bool,

    /// Also append save messages to `<dir>/savekeeper.log`
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a level time for a profile, creating the profile if needed
    Submit {
        #[arg(long)]
        profile: String,
        #[arg(long)]
        level: i32,
        #[arg(long)]
        time: f64,
    },

    /// Print one profile's stored progress
    Show {
        #[arg(long)]
        profile: String,
    },

    /// List every profile with a save file
    Profiles,

    /// Print the leaderboard for a level
    Scores {
        #[arg(long)]
        level: i32,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Effective configuration: config file (or defaults), then flags.
    pub fn resolve_config(&self) -> Result<SaveConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SaveConfig::load(path)?,
            None => SaveConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if self.cipher {
            config.ciphering_enabled = true;
        }
        if self.durability_sync {
            config.requires_durability_sync = true;
        }
        // A command line invocation is itself the user interaction.
        config.requires_interaction_gate = false;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_submit() {
        let cli = Cli::parse_from([
            "savekeeper", "submit", "--profile", "Ada", "--level", "3", "--time", "12.5",
        ]);
        match cli.command {
            Commands::Submit {
                profile,
                level,
                time,
            } => {
                assert_eq!(profile, "Ada");
                assert_eq!(level, 3);
                assert_eq!(time, 12.5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "dataDir": "/from/file", "settleIntervalMs": 7, "requiresInteractionGate": true }"#,
        )
        .unwrap();

        let cli = Cli::parse_from([
            "savekeeper",
            "--config",
            path.to_str().unwrap(),
            "--data-dir",
            "/from/flag",
            "--cipher",
            "profiles",
        ]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/from/flag"));
        assert!(config.ciphering_enabled);
        assert_eq!(config.settle_interval_ms, 7);
        assert!(!config.requires_interaction_gate);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["savekeeper", "scores", "--level", "1", "--json", "--cipher"]);
        assert!(cli.cipher);
        assert!(matches!(cli.command, Commands::Scores { level: 1, json: true }));
    }
}
