//! Run configuration for dataset generation and the simulation adapter.
//!
//! Every section has defaults, so an empty YAML document is a valid config.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("incompatible parser settings: {0} and {1}")]
    Incompatible(&'static str, &'static str),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Parser feature switches handed to the external parser.
    #[serde(default)]
    pub parser: ParserSettings,
    /// Oracle replay settings.
    #[serde(default)]
    pub replay: ReplayConfig,
    /// Dataset output settings.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Corpus run settings.
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Simulation adapter settings.
    #[serde(default)]
    pub env: EnvConfig,
}

/// Parser switches. `linkage` and `unlabeled` cannot be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParserSettings {
    #[serde(default)]
    pub implicit: bool,
    #[serde(default)]
    pub linkage: bool,
    #[serde(default)]
    pub unlabeled: bool,
}

impl ParserSettings {
    pub const NAMES: [&'static str; 3] = ["implicit", "linkage", "unlabeled"];
    const INCOMPATIBLE: [(&'static str, &'static str); 1] = [("linkage", "unlabeled")];

    pub fn from_names(names: &[&str]) -> Self {
        Self {
            implicit: names.contains(&"implicit"),
            linkage: names.contains(&"linkage"),
            unlabeled: names.contains(&"unlabeled"),
        }
    }

    fn is_set(&self, name: &str) -> bool {
        match name {
            "implicit" => self.implicit,
            "linkage" => self.linkage,
            "unlabeled" => self.unlabeled,
            _ => false,
        }
    }

    /// Names of the enabled switches, in declaration order.
    pub fn list(&self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .copied()
            .filter(|n| self.is_set(n))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (a, b) in Self::INCOMPATIBLE {
            if self.is_set(a) && self.is_set(b) {
                return Err(ConfigError::Incompatible(a, b));
            }
        }
        Ok(())
    }

    /// Every compatible combination, ordered by number of enabled switches.
    pub fn all() -> Vec<ParserSettings> {
        let mut out = Vec::new();
        for n in 0..=Self::NAMES.len() {
            for mask in 0u8..(1 << Self::NAMES.len()) {
                if mask.count_ones() as usize != n {
                    continue;
                }
                let names: Vec<&str> = Self::NAMES
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, n)| *n)
                    .collect();
                let s = Self::from_names(&names);
                if s.validate().is_ok() {
                    out.push(s);
                }
            }
        }
        out
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            implicit: true,
            linkage: false,
            unlabeled: false,
        }
    }
}

impl fmt::Display for ParserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self.list();
        if list.is_empty() {
            f.write_str("default")
        } else {
            f.write_str(&list.join("-"))
        }
    }
}

/// Oracle replay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplayConfig {
    /// Step ceiling per graph; a replay that reaches it is treated as a stalled oracle.
    #[serde(default = "default_replay_max_steps")]
    pub max_steps: u32,
}

fn default_replay_max_steps() -> u32 {
    10_000
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_steps: default_replay_max_steps(),
        }
    }
}

/// Dataset output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Output archive path (gzip-compressed JSON array).
    #[serde(default = "default_dataset_out")]
    pub out: String,
    /// gzip level, 0..=9.
    #[serde(default = "default_dataset_compression_level")]
    pub compression_level: u32,
}

fn default_dataset_out() -> String {
    "data/env_training_data.json.gz".to_string()
}

fn default_dataset_compression_level() -> u32 {
    6
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            out: default_dataset_out(),
            compression_level: default_dataset_compression_level(),
        }
    }
}

/// Corpus run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    /// Replay graphs on the rayon pool, one shard per graph.
    #[serde(default)]
    pub parallel: bool,
    /// Optional NDJSON event log path.
    #[serde(default)]
    pub events: Option<String>,
    /// Print one progress marker per graph to stderr.
    #[serde(default = "default_corpus_progress")]
    pub progress: bool,
}

fn default_corpus_progress() -> bool {
    true
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            events: None,
            progress: default_corpus_progress(),
        }
    }
}

/// Simulation adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnvConfig {
    /// Trained reward estimator checkpoint (safetensors).
    #[serde(default = "default_env_checkpoint")]
    pub checkpoint: String,
}

fn default_env_checkpoint() -> String {
    "env_r_model.safetensors".to_string()
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            checkpoint: default_env_checkpoint(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parser.validate()?;
        if self.replay.max_steps == 0 {
            return Err(ConfigError::Invalid("replay.max_steps must be > 0"));
        }
        if self.dataset.compression_level > 9 {
            return Err(ConfigError::Invalid("dataset.compression_level must be 0..=9"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").expect("empty config");
        assert!(config.parser.implicit);
        assert_eq!(config.replay.max_steps, 10_000);
        assert_eq!(config.dataset.out, "data/env_training_data.json.gz");
        assert_eq!(config.dataset.compression_level, 6);
        assert!(!config.corpus.parallel);
        assert!(config.corpus.progress);
        assert_eq!(config.env.checkpoint, "env_r_model.safetensors");
    }

    #[test]
    fn test_parse_yaml_string() {
        let yaml = r#"
parser:
  implicit: true
  linkage: true

replay:
  max_steps: 500

dataset:
  out: "out/train.json.gz"

corpus:
  parallel: true
  events: "logs/corpus.ndjson"
"#;

        let config = Config::from_yaml(yaml).expect("Failed to parse YAML");
        assert_eq!(config.parser.to_string(), "implicit-linkage");
        assert_eq!(config.parser.list(), vec!["implicit", "linkage"]);
        assert_eq!(config.replay.max_steps, 500);
        assert_eq!(config.dataset.out, "out/train.json.gz");
        // Check defaults are applied
        assert_eq!(config.dataset.compression_level, 6);
        assert!(config.corpus.parallel);
        assert_eq!(config.corpus.events.as_deref(), Some("logs/corpus.ndjson"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yaml");
        std::fs::write(&path, "replay:\n  max_steps: 7\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.replay.max_steps, 7);
    }

    #[test]
    fn test_incompatible_settings_rejected() {
        let yaml = "parser:\n  linkage: true\n  unlabeled: true\n";
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Incompatible("linkage", "unlabeled")
        ));
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        let err = Config::from_yaml("replay:\n  max_steps: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let invalid_yaml = "this is not: valid: yaml: {{{}}}";
        let result = Config::from_yaml(invalid_yaml);
        assert!(result.is_err());
    }

    #[test]
    fn settings_all_excludes_incompatible_pairs() {
        let all = ParserSettings::all();
        // 2^3 combinations minus {linkage, unlabeled} and {implicit, linkage, unlabeled}.
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].to_string(), "default");
        assert!(all[0].list().is_empty());
        assert!(all.iter().all(|s| !(s.linkage && s.unlabeled)));
    }
}
