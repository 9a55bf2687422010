use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_FOOTBALL_DATA_URL: &str = "https://api.football-data.org/v4";
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw";
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;

/// Soccer match data collection and outcome prediction
#[derive(Parser, Debug, Clone)]
#[command(name = "soccer-predict", version, about)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(long, env = "SOCCER_CONFIG", default_value = "config.yaml", global = true)]
    pub config: PathBuf,

    /// football-data.org API key (overrides the settings file)
    #[arg(long, env = "FOOTBALL_DATA_API_KEY", global = true)]
    pub api_key: Option<String>,

    /// Directory raw match files are written to (overrides the settings file)
    #[arg(long, env = "SOCCER_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Per-source fetch timeout in seconds (overrides the settings file)
    #[arg(long, env = "SOCCER_SOURCE_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect match data for a league and season
    Collect(CollectArgs),
    /// Train prediction models
    Train(TrainArgs),
    /// Predict a match outcome
    Predict(PredictArgs),
    /// Show configuration and collected data
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// League code (e.g. PL, PD, BL1)
    #[arg(long)]
    pub league: String,

    /// Season (e.g. 2023-2024)
    #[arg(long)]
    pub season: String,

    /// Which sources to use
    #[arg(long, value_enum, default_value_t = SourceMode::Live)]
    pub source: SourceMode,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// Configured remote sources
    Live,
    /// Built-in demo matches, no network
    Demo,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Model type to train
    #[arg(long, default_value = "xgboost")]
    pub model: String,

    /// Training epochs
    #[arg(long, default_value = "100")]
    pub epochs: u32,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Home team
    #[arg(long)]
    pub home: String,

    /// Away team
    #[arg(long)]
    pub away: String,

    /// Match date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Contents of the YAML settings file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data_sources: DataSources,
    pub collection: CollectionSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSources {
    pub football_data_org: FootballDataSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct FootballDataSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectionSettings {
    pub timeout_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let settings = Self::from_yaml(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Apply command-line / environment overrides on top of the file values.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(key) = &cli.api_key {
            self.data_sources.football_data_org.api_key = Some(key.clone());
        }
        if let Some(dir) = &cli.output_dir {
            self.collection.output_dir = Some(dir.clone());
        }
        if let Some(secs) = cli.timeout_secs {
            self.collection.timeout_secs = Some(secs);
        }
        self
    }

    /// The football-data.org key, if one is set and non-blank.
    pub fn football_data_api_key(&self) -> Option<&str> {
        self.data_sources
            .football_data_org
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn football_data_url(&self) -> &str {
        self.data_sources
            .football_data_org
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_FOOTBALL_DATA_URL)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.collection
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(
            self.collection
                .timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_key_path() {
        let yaml = r#"
data_sources:
  football_data_org:
    api_key: "abc123"
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.football_data_api_key(), Some("abc123"));
        assert_eq!(settings.football_data_url(), DEFAULT_FOOTBALL_DATA_URL);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let yaml = r#"
models:
  xgboost:
    depth: 6
data_sources:
  understat:
    enabled: true
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.football_data_api_key(), None);
    }

    #[test]
    fn test_blank_key_counts_as_absent() {
        let yaml = "data_sources:\n  football_data_org:\n    api_key: '  '\n";
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.football_data_api_key(), None);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("soccer-predict-no-such-config.yaml");
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output_dir(), PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(
            settings.source_timeout(),
            Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!(
            "soccer-predict-bad-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "data_sources: [unclosed").unwrap();
        let err = Settings::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let cli = Cli::parse_from([
            "soccer-predict",
            "--api-key",
            "from-cli",
            "--timeout-secs",
            "5",
            "status",
        ]);
        let yaml = "data_sources:\n  football_data_org:\n    api_key: from-file\ncollection:\n  output_dir: out\n";
        let settings = Settings::from_yaml(yaml).unwrap().with_overrides(&cli);
        assert_eq!(settings.football_data_api_key(), Some("from-cli"));
        assert_eq!(settings.source_timeout(), Duration::from_secs(5));
        assert_eq!(settings.output_dir(), PathBuf::from("out"));
    }

    #[test]
    fn test_collect_args() {
        let cli = Cli::parse_from([
            "soccer-predict",
            "collect",
            "--league",
            "PL",
            "--season",
            "2023-2024",
            "--source",
            "demo",
        ]);
        match cli.command {
            Command::Collect(args) => {
                assert_eq!(args.league, "PL");
                assert_eq!(args.season, "2023-2024");
                assert_eq!(args.source, SourceMode::Demo);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
