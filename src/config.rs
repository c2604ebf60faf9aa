//! Configuration: required positional CLI arguments plus an optional TOML
//! file for ambient settings the positional CLI doesn't cover.
//!
//! CLI parsing failures and validation failures are usage errors: printed to
//! stderr and exited with code 1, matching the original tool's documented
//! exit status rather than clap's default (2).

use crate::dispatcher::schedalg::Schedalg;
use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Raw positional arguments, parsed as strings so invalid numerics and
/// schedalg literals can be reported as the same kind of usage error as a
/// missing argument, rather than clap's own exit-code-2 parse failure.
#[derive(Parser, Debug)]
#[command(name = "dispatchd")]
#[command(about = "A concurrent HTTP dispatcher with configurable overload admission policies")]
struct CliArgs {
    port: String,
    threads: String,
    queue_size: String,
    schedalg: String,

    /// Path to a TOML file with ambient settings (log level, doc root, read timeout).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    log_level: Option<String>,
    #[serde(default)]
    doc_root: Option<PathBuf>,
    #[serde(default)]
    read_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_read_timeout_secs() -> u64 {
    5
}

/// Fully resolved configuration: required positional values plus ambient
/// settings, CLI always taking precedence over the TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub threads: usize,
    pub queue_size: usize,
    pub schedalg: Schedalg,
    pub log_level: String,
    pub doc_root: PathBuf,
    pub read_timeout_secs: u64,
}

impl Config {
    /// Parse `std::env::args()` and merge in an optional `--config` TOML
    /// file. On any usage error, prints a diagnostic to stderr and exits
    /// the process with code 1 rather than returning.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    fn try_load() -> Result<Self, ConfigError> {
        let program = std::env::args().next().unwrap_or_else(|| "dispatchd".to_string());
        let cli = CliArgs::try_parse().map_err(|_| ConfigError::Usage { program })?;

        let port: u16 = cli
            .port
            .parse()
            .ok()
            .filter(|&p: &u16| p > 0)
            .ok_or_else(|| ConfigError::InvalidPort(cli.port.clone()))?;

        let threads: usize = cli
            .threads
            .parse()
            .ok()
            .filter(|&t| t >= 1)
            .ok_or_else(|| ConfigError::InvalidThreads(cli.threads.clone()))?;

        let queue_size: usize = cli
            .queue_size
            .parse()
            .ok()
            .filter(|&q| q >= 1)
            .ok_or_else(|| ConfigError::InvalidQueueSize(cli.queue_size.clone()))?;

        let schedalg = Schedalg::from_str(&cli.schedalg)?;

        let toml_config = match &cli.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
                    path: path.clone(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => TomlConfig::default(),
        };

        Ok(Config {
            port,
            threads,
            queue_size,
            schedalg,
            log_level: toml_config.log_level.unwrap_or_else(default_log_level),
            doc_root: toml_config.doc_root.unwrap_or_else(|| PathBuf::from(".")),
            read_timeout_secs: toml_config.read_timeout_secs.unwrap_or_else(default_read_timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_config_defaults_are_empty() {
        let config = TomlConfig::default();
        assert!(config.log_level.is_none());
        assert!(config.doc_root.is_none());
        assert!(config.read_timeout_secs.is_none());
    }

    #[test]
    fn toml_config_parses_ambient_settings() {
        let toml_str = r#"
            log_level = "debug"
            doc_root = "/srv/www"
            read_timeout_secs = 10
        "#;
        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.doc_root, Some(PathBuf::from("/srv/www")));
        assert_eq!(config.read_timeout_secs, Some(10));
    }
}
