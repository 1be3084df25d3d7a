//! `tessera.toml` configuration: code generation targets, sample-data
//! generator bounds, log filter and connection profiles.
//!
//! Every section is optional and unknown keys are rejected, so a typo fails
//! loudly instead of silently falling back to a default.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error as ThisError;

/// File name looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_MAX_ARRAY_LEN: usize = 2;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("connection profile '{0}' is not configured")]
    UnknownProfile(String),
}

///
/// TesseraConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TesseraConfig {
    pub codegen: CodegenConfig,
    pub generator: GeneratorConfig,
    pub log: LogConfig,
    pub profiles: BTreeMap<String, ProfileConfig>,
}

impl TesseraConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = text.parse::<Self>()?;
        tracing::debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn profile(&self, name: &str) -> Result<&ProfileConfig, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "generator.max_depth must be at least 1".to_string(),
            ));
        }
        if self.codegen.out_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("codegen.out_dir is empty".to_string()));
        }
        for (name, profile) in &self.profiles {
            if profile.connector_type.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "profiles.{name}.type is empty"
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for TesseraConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;

        Ok(config)
    }
}

///
/// CodegenConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    pub out_dir: PathBuf,

    /// Target names, checked by the code generator.
    pub targets: Vec<String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("generated"),
            targets: vec!["loopback".to_string()],
        }
    }
}

///
/// GeneratorConfig
///
/// Bounds for sample-data generation. Past `max_depth` only required
/// properties are generated and arrays stay empty; `seed` makes runs
/// reproducible.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub max_depth: usize,
    pub max_array_len: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            seed: None,
        }
    }
}

///
/// LogConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

///
/// ProfileConfig
/// A named connection profile handed to the connector registry.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(rename = "type")]
    pub connector_type: String,

    #[serde(default)]
    pub network_id: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config: TesseraConfig = "".parse().unwrap();

        assert_eq!(config, TesseraConfig::default());
        assert_eq!(config.generator.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.codegen.targets, ["loopback"]);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn parses_every_section() {
        let config: TesseraConfig = r#"
            [codegen]
            out_dir = "out"
            targets = ["loopback", "plantuml"]

            [generator]
            max_depth = 2
            seed = 42

            [log]
            filter = "tessera=debug"

            [profiles.dev]
            type = "embedded"
            network_id = "dev-net"
            options = { region = "local" }
        "#
        .parse()
        .unwrap();

        assert_eq!(config.codegen.out_dir, PathBuf::from("out"));
        assert_eq!(config.codegen.targets, ["loopback", "plantuml"]);
        assert_eq!(config.generator.max_depth, 2);
        assert_eq!(config.generator.max_array_len, DEFAULT_MAX_ARRAY_LEN);
        assert_eq!(config.generator.seed, Some(42));

        let dev = config.profile("dev").unwrap();
        assert_eq!(dev.connector_type, "embedded");
        assert_eq!(dev.network_id, "dev-net");
        assert_eq!(dev.options.get("region").map(String::as_str), Some("local"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = "[generator]\nmax_dept = 3\n".parse::<TesseraConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = "[colour]\n".parse::<TesseraConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = "[generator]\nmax_depth = 0\n".parse::<TesseraConfig>().unwrap_err();
        assert!(err.to_string().contains("max_depth"));

        let err = "[profiles.dev]\ntype = \" \"\n".parse::<TesseraConfig>().unwrap_err();
        assert!(err.to_string().contains("profiles.dev.type"));
    }

    #[test]
    fn unknown_profile_is_named() {
        let err = TesseraConfig::default().profile("prod").unwrap_err();
        assert_eq!(err.to_string(), "connection profile 'prod' is not configured");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let missing = TesseraConfig::load_or_default(&path).unwrap();
        assert_eq!(missing, TesseraConfig::default());
        assert!(matches!(
            TesseraConfig::load(&path),
            Err(ConfigError::Io { .. })
        ));

        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[log]\nfilter = \"warn\"").unwrap();

        let config = TesseraConfig::load(&path).unwrap();
        assert_eq!(config.log.filter, "warn");
    }
}
