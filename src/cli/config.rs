//! PPCC configuration file handling
//!
//! The operator config is TOML. It names the seed, the depth bound and one
//! TGF graph file per telecom; the telecom's position in `[[telecoms]]` is
//! its index in warrants. Relative graph paths resolve against the config
//! file's directory.

use ppcc::frontier::DEFAULT_FRONTIER_CAPACITY;
use ppcc::graph::{split_by_owner, to_tgf, OwnerPair};
use ppcc::protocol::{RoundConfig, SignaturePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default round deadline, as written in config files
const DEFAULT_TIMEOUT: &str = "30s";

const DEFAULT_MAX_DEPTH: u32 = 2;

/// Directory, next to the config, that holds the demo graphs
const GRAPH_DIR: &str = "graphs";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("Failed to write '{path}': {reason}")]
    Write { path: String, reason: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid timeout '{value}': {reason}")]
    Timeout { value: String, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// PPCC operator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpccConfig {
    pub round: RoundSettings,

    /// One entry per telecom, in index order
    #[serde(default)]
    pub telecoms: Vec<TelecomEntry>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Round parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSettings {
    /// Identifier the chain starts from
    pub seed: String,

    /// Index of the telecom owning the seed
    #[serde(default)]
    pub seed_owner: usize,

    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Round deadline in humantime form ("30s", "2m"); "0s" waits forever
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default)]
    pub signature_policy: SignaturePolicy,

    #[serde(default = "default_frontier_capacity")]
    pub frontier_capacity: usize,
}

/// A telecom's graph partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelecomEntry {
    /// TGF file with this telecom's subgraph
    pub graph: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins if set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_frontier_capacity() -> usize {
    DEFAULT_FRONTIER_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl PpccConfig {
    /// Create a configuration for `seed` over the given graph files
    #[cfg(test)]
    pub fn new(seed: impl Into<String>, graphs: Vec<PathBuf>) -> Self {
        Self {
            round: RoundSettings {
                seed: seed.into(),
                seed_owner: 0,
                max_depth: DEFAULT_MAX_DEPTH,
                timeout: default_timeout(),
                signature_policy: SignaturePolicy::default(),
                frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            },
            telecoms: graphs
                .into_iter()
                .map(|graph| TelecomEntry { graph })
                .collect(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    ///
    /// Relative graph paths come back resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut config: PpccConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for telecom in &mut config.telecoms {
            if telecom.graph.is_relative() {
                telecom.graph = base.join(&telecom.graph);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        write_file(path, &contents)
    }

    /// Check the settings a round cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telecoms.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[telecoms]] entry is required".to_string(),
            ));
        }
        if self.round.seed.trim().is_empty() {
            return Err(ConfigError::Invalid("round.seed is empty".to_string()));
        }
        self.timeout()?;
        Ok(())
    }

    /// Parsed round deadline; `None` when set to zero
    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        let limit = humantime::parse_duration(&self.round.timeout).map_err(|e| {
            ConfigError::Timeout {
                value: self.round.timeout.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok((!limit.is_zero()).then_some(limit))
    }

    /// Driver settings for the protocol
    pub fn round_config(&self) -> Result<RoundConfig, ConfigError> {
        Ok(RoundConfig {
            timeout: self.timeout()?,
            signature_policy: self.round.signature_policy,
            frontier_capacity: self.round.frontier_capacity,
        })
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        let telecoms: String = (0..DEMO_TELECOMS)
            .map(|i| format!("[[telecoms]]\ngraph = \"{GRAPH_DIR}/telecom-{i}.tgf\"\n\n"))
            .collect();

        format!(
            r##"# PPCC Configuration
#
# One round chains outward from the seed identifier, breadth-first,
# for at most max_depth hops. Each [[telecoms]] entry is one telecom;
# its position in the list is its index (0, 1, 2, ...).

[round]
# Identifier to start from and the index of the telecom that owns it
seed = "{DEMO_SEED}"
seed_owner = 0

# Hops allowed from the seed (0 returns the seed only)
max_depth = {DEFAULT_MAX_DEPTH}

# Deadline for the whole round ("0s" waits forever)
timeout = "{DEFAULT_TIMEOUT}"

# "enforce" drops queries with a bad signature, "log-only" answers them anyway
signature_policy = "enforce"

# Initial frontier capacity (grows on demand)
frontier_capacity = {DEFAULT_FRONTIER_CAPACITY}

# Graph files in Trivial Graph Format: "identifier owner" node lines,
# a "#" line, then "identifier identifier [weight]" edge lines.
# Relative paths are resolved against this file's directory.
{telecoms}[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG overrides)
level = "{DEFAULT_LOG_LEVEL}"
"##
        )
    }

    /// Create and save a default configuration file plus its demo graphs
    pub fn create_default(config_path: &Path) -> Result<(), ConfigError> {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        for (i, subgraph) in demo_subgraphs().iter().enumerate() {
            let graph_path = base.join(GRAPH_DIR).join(format!("telecom-{i}.tgf"));
            write_file(&graph_path, &to_tgf(subgraph))?;
        }

        write_file(config_path, &Self::generate_default_toml())
    }
}

const DEMO_TELECOMS: usize = 3;
const DEMO_SEED: &str = "15550100";

/// Demo graph: a chain across three telecoms with a branch at the end.
///
/// ```text
/// 15550100(0) - 15550101(1) - 15550102(2) - 15550103(0)
///                                   \
///                                    15550104(1)
/// ```
fn demo_subgraphs() -> Vec<ppcc::graph::LocalSubgraph> {
    let nodes = [
        OwnerPair::new(DEMO_SEED, 0),
        OwnerPair::new("15550101", 1),
        OwnerPair::new("15550102", 2),
        OwnerPair::new("15550103", 0),
        OwnerPair::new("15550104", 1),
    ];
    let edges = [
        (nodes[0].clone(), nodes[1].clone()),
        (nodes[1].clone(), nodes[2].clone()),
        (nodes[2].clone(), nodes[3].clone()),
        (nodes[2].clone(), nodes[4].clone()),
    ];
    split_by_owner(DEMO_TELECOMS, &nodes, &edges)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_error = |e: std::io::Error| ConfigError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}

/// Get the default config file path
///
/// - Linux: ~/.config/ppcc/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ppcc")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppcc::graph::read_tgf;
    use tempfile::TempDir;

    #[test]
    fn test_new_config_defaults() {
        let config = PpccConfig::new("A", vec![PathBuf::from("a.tgf")]);

        assert_eq!(config.round.seed, "A");
        assert_eq!(config.round.seed_owner, 0);
        assert_eq!(config.round.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.round.signature_policy, SignaturePolicy::Enforce);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let graph = temp_dir.path().join("t0.tgf");

        let mut config = PpccConfig::new("A", vec![graph.clone()]);
        config.round.signature_policy = SignaturePolicy::LogOnly;
        config.save(&config_path).unwrap();

        let loaded = PpccConfig::load(&config_path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.telecoms[0].graph, graph);
    }

    #[test]
    fn test_relative_graph_paths_resolve_against_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[round]
seed = "A"

[[telecoms]]
graph = "graphs/t0.tgf"
"#,
        )
        .unwrap();

        let config = PpccConfig::load(&config_path).unwrap();
        assert_eq!(
            config.telecoms[0].graph,
            temp_dir.path().join("graphs/t0.tgf")
        );
        // Defaults applied
        assert_eq!(config.round.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_timeout_parsing() {
        let mut config = PpccConfig::new("A", vec![PathBuf::from("a.tgf")]);

        config.round.timeout = "2m".to_string();
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(120)));

        config.round.timeout = "0s".to_string();
        assert_eq!(config.timeout().unwrap(), None);

        config.round.timeout = "soon".to_string();
        assert!(matches!(config.timeout(), Err(ConfigError::Timeout { .. })));
    }

    #[test]
    fn test_round_config() {
        let mut config = PpccConfig::new("A", vec![PathBuf::from("a.tgf")]);
        config.round.frontier_capacity = 4;
        config.round.signature_policy = SignaturePolicy::LogOnly;

        let round = config.round_config().unwrap();
        assert_eq!(round.frontier_capacity, 4);
        assert_eq!(round.signature_policy, SignaturePolicy::LogOnly);
        assert_eq!(round.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate_rejects_missing_telecoms() {
        let config = PpccConfig::new("A", Vec::new());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_empty_seed() {
        let config = PpccConfig::new("  ", vec![PathBuf::from("a.tgf")]);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = PpccConfig::load(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("ppcc").join("config.toml");

        PpccConfig::create_default(&config_path).unwrap();
        assert!(config_path.exists());

        let config = PpccConfig::load(&config_path).unwrap();
        assert_eq!(config.round.seed, DEMO_SEED);
        assert_eq!(config.telecoms.len(), DEMO_TELECOMS);

        for telecom in &config.telecoms {
            assert!(telecom.graph.exists());
            read_tgf(&telecom.graph).unwrap();
        }
        let middle = read_tgf(&config.telecoms[1].graph).unwrap();
        assert!(middle.contains_node(&OwnerPair::new("15550101", 1)));
        assert!(middle.contains_edge(
            &OwnerPair::new("15550102", 2),
            &OwnerPair::new("15550104", 1)
        ));
    }

    #[test]
    fn test_generate_default_toml() {
        let toml = PpccConfig::generate_default_toml();

        assert!(toml.contains("seed = \"15550100\""));
        assert!(toml.contains("graph = \"graphs/telecom-2.tgf\""));
        assert!(toml.contains("signature_policy = \"enforce\""));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains(r##"a "#" line"##));

        let parsed: PpccConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.round.seed, DEMO_SEED);
        assert_eq!(parsed.telecoms.len(), DEMO_TELECOMS);
        assert_eq!(parsed.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("ppcc/config.toml"));
    }
}
