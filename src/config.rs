use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::sources::cdn::{DEFAULT_CDN_URL, DEFAULT_FILES, DEFAULT_PACKAGE};
use crate::engine::tsc::{DEFAULT_COMPILER_ARGS, DEFAULT_LIBS, DEFAULT_NODE};
use crate::search::resolver::ErrorPolicy;
use crate::version::filter::VersionFilter;
use crate::version::registries::npm::DEFAULT_BASE_URL;

/// Application configuration structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub cache: CacheConfig,
    pub registry: RegistryConfig,
    pub cdn: CdnConfig,
    pub filter: VersionFilter,
    pub strategy: Strategy,
    pub on_error: ErrorPolicy,
    pub check: CheckConfig,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Directory under which the cache root is created
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: std::env::temp_dir(),
        }
    }
}

/// Registry listing the candidate versions
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub package: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
        }
    }
}

/// CDN serving the engine artifacts
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CdnConfig {
    pub url: String,
    /// Files tried in order inside each package version
    pub files: Vec<String>,
    /// Libraries fetched with each compiler; keep in line with `--lib`
    pub libs: Vec<String>,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CDN_URL.to_string(),
            files: DEFAULT_FILES.iter().map(|f| f.to_string()).collect(),
            libs: DEFAULT_LIBS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Compiler invocation
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckConfig {
    /// JavaScript runtime used to run the compiler
    pub node: PathBuf,
    /// Compiler flags placed before the document paths
    pub args: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            node: PathBuf::from(DEFAULT_NODE),
            args: DEFAULT_COMPILER_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Traversal strategy over the candidate list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Binary search, assumes compatibility is monotonic
    #[default]
    Binary,
    /// Evaluate every candidate
    Sequential,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Config {
    /// Load configuration from a JSON file; missing fields use defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for version-floor.
/// Uses $XDG_DATA_HOME/version-floor if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/version-floor,
/// or ./version-floor if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("version-floor.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("version-floor")
}
