use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to fetch {version}: {reason}")]
    Fetch { version: String, reason: String },

    #[error("Failed to load {version}: {reason}")]
    Load { version: String, reason: String },

    #[error("Version {0} not in cache")]
    NotFound(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Failed to prepare check environment: {0}")]
    Environment(#[from] std::io::Error),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler exited with {status} without reporting diagnostics: {stderr}")]
    Crashed { status: String, stderr: String },
}
