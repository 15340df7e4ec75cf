//! Engine test utilities

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use semver::Version;

use version_floor::engine::cache::EngineLoader;
use version_floor::engine::error::{CacheError, CheckError};
use version_floor::engine::source::ArtifactSource;
use version_floor::engine::tsc::{Checker, Diagnostic};
use version_floor::input::Documents;

/// Artifact source serving `engine <version>` and counting fetches
#[derive(Default)]
pub struct CountingSource {
    fetches: AtomicUsize,
    missing: Vec<String>,
}

impl CountingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions for which the source reports a non-success status
    pub fn with_missing(mut self, version: &str) -> Self {
        self.missing.push(version.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for CountingSource {
    async fn fetch(&self, version: &str) -> Result<Vec<u8>, CacheError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.missing.iter().any(|v| v == version) {
            return Err(CacheError::Fetch {
                version: version.to_string(),
                reason: "Unexpected status: 404 Not Found".to_string(),
            });
        }
        Ok(format!("engine {}", version).into_bytes())
    }
}

/// Loader whose engine is the artifact decoded as UTF-8
pub struct TextLoader;

impl EngineLoader for TextLoader {
    type Engine = String;
    const ARTIFACT_EXTENSION: &'static str = "txt";

    fn instantiate(
        &self,
        version: &str,
        _artifact: &Path,
        bytes: &[u8],
    ) -> Result<String, CacheError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CacheError::Load {
            version: version.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Engine standing in for one compiler version
#[derive(Debug)]
pub struct FakeEngine {
    pub version: Version,
}

impl FakeEngine {
    pub fn new(version: &str) -> Self {
        Self {
            version: Version::parse(version).unwrap(),
        }
    }
}

/// Reports one diagnostic per document for engines older than `threshold`
pub struct FakeChecker {
    threshold: Version,
}

impl FakeChecker {
    pub fn new(threshold: &str) -> Self {
        Self {
            threshold: Version::parse(threshold).unwrap(),
        }
    }
}

#[async_trait]
impl Checker for FakeChecker {
    type Engine = FakeEngine;

    async fn check(
        &self,
        engine: &FakeEngine,
        documents: &Documents,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        if engine.version >= self.threshold {
            return Ok(Vec::new());
        }
        Ok(documents
            .keys()
            .map(|path| Diagnostic {
                file: Some(path.display().to_string()),
                line: Some(1),
                column: Some(1),
                code: "TS2304".to_string(),
                message: "Cannot find name 'NoInfer'.".to_string(),
            })
            .collect())
    }
}

pub fn candidates(versions: &[&str]) -> Vec<String> {
    versions.iter().map(|v| v.to_string()).collect()
}
