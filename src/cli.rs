//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "micwatch", version)]
#[command(about = "Report when any application starts or stops using the microphone", long_about = None)]
pub struct Cli {
    /// Milliseconds between two polls of the usage records
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Output format of the state stream (text or json)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the configuration file path and exit
    #[arg(long)]
    pub print_config_path: bool,

    /// Save the effective configuration, including flags, to the config file and exit
    #[arg(long, conflicts_with = "print_config_path")]
    pub write_config: bool,
}

impl Cli {
    /// Overlay command line values on top of a loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigManager;

    #[test]
    fn test_defaults_keep_config() {
        let cli = Cli::try_parse_from(["micwatch"]).unwrap();
        let config = Config {
            poll_interval_ms: 250,
            format: OutputFormat::Json,
        };
        assert_eq!(cli.apply(config.clone()), config);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["micwatch", "--poll-interval-ms", "200", "--format", "json"])
            .unwrap();
        let config = cli.apply(Config::default());
        assert_eq!(config.poll_interval_ms, 200);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_write_config_persists_flags() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("micwatch").join("micwatch.toml");
        let cli = Cli::try_parse_from([
            "micwatch",
            "--write-config",
            "--format",
            "json",
            "--poll-interval-ms",
            "750",
        ])
        .unwrap();
        assert!(cli.write_config);

        let manager = ConfigManager::with_config_path(&path);
        let config = cli.apply(manager.load().unwrap());
        manager.save(&config).unwrap();

        let reloaded = ConfigManager::with_config_path(&path).load().unwrap();
        assert_eq!(reloaded.format, OutputFormat::Json);
        assert_eq!(reloaded.poll_interval_ms, 750);
    }

    #[test]
    fn test_write_config_conflicts_with_print() {
        assert!(
            Cli::try_parse_from(["micwatch", "--write-config", "--print-config-path"]).is_err()
        );
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["micwatch", "--poll-interval-ms", "0"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["micwatch", "--format", "xml"]).is_err());
    }
}
