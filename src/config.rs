//! User configuration.
//!
//! Looked up in this order, first hit wins:
//!
//! 1. an explicit path (`--config`);
//! 2. `.phpantom-typearg.toml` in the workspace root;
//! 3. `phpantom_typearg/config.toml` in the user's config directory;
//! 4. built-in defaults.
//!
//! ```toml
//! marker = "@returnTypeArg"
//! exclude = ["vendor", "node_modules", ".git"]
//! log_level = "info"
//!
//! [severity]
//! unknown-parameter = "warning"
//! not-inferable = "warning"
//! ```

use std::path::{Path, PathBuf};

use etcetera::BaseStrategy;
use serde::Deserialize;
use thiserror::Error;

use crate::annotation::RETURN_TYPE_ARG_MARKER;
use crate::diagnostics::{IssueKind, Severity};

/// File name looked up in the workspace root.
pub const WORKSPACE_CONFIG_FILE: &str = ".phpantom-typearg.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The docblock tag naming the type-determining parameter.
    pub marker: String,
    /// Directory names skipped while indexing a workspace.
    pub exclude: Vec<String>,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub severity: SeverityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: RETURN_TYPE_ARG_MARKER.to_string(),
            exclude: vec![
                "vendor".to_string(),
                "node_modules".to_string(),
                ".git".to_string(),
            ],
            log_level: "info".to_string(),
            severity: SeverityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct SeverityConfig {
    pub unknown_parameter: Severity,
    pub not_inferable: Severity,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            unknown_parameter: Severity::Warning,
            not_inferable: Severity::Warning,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Load the configuration for a workspace.
    ///
    /// Returns the path the configuration came from, `None` for defaults.
    pub fn discover(
        explicit: Option<&Path>,
        workspace_root: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_path(path)?, Some(path.to_path_buf())));
        }

        let candidates = workspace_root
            .map(|root| root.join(WORKSPACE_CONFIG_FILE))
            .into_iter()
            .chain(user_config_path());

        for path in candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading config");
                return Ok((Self::load_from_path(&path)?, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn severity_for(&self, kind: IssueKind) -> Severity {
        match kind {
            IssueKind::UnknownParameter => self.severity.unknown_parameter,
            IssueKind::NotInferable => self.severity.not_inferable,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.marker.starts_with('@') || self.marker.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "marker must be a single docblock tag starting with '@', got {:?}",
                self.marker
            )));
        }
        Ok(())
    }
}

/// `<config dir>/phpantom_typearg/config.toml`, when a home directory
/// can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("phpantom_typearg").join("config.toml"))
}
