use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::engine::error::CacheError;
use crate::engine::source::ArtifactSource;

/// Directory created under the configured cache directory
pub const CACHE_DIR_NAME: &str = "version-floor-cache";

/// Turns the raw bytes of one engine version into a ready-to-use instance
pub trait EngineLoader: Send + Sync {
    type Engine: Send + Sync;

    /// File extension used for the on-disk artifact
    const ARTIFACT_EXTENSION: &'static str;

    /// Instantiate the engine from `bytes`, which are persisted at `artifact`
    fn instantiate(
        &self,
        version: &str,
        artifact: &Path,
        bytes: &[u8],
    ) -> Result<Self::Engine, CacheError>;
}

/// Memoized access to versioned engine instances
///
/// Residency in memory is controlled by the caller: entries are only evicted
/// through [`EngineCache::free`], [`EngineCache::clear`] or [`EngineCache::purge`].
#[async_trait::async_trait]
pub trait EngineCache: Send + Sync {
    type Engine: Send + Sync;

    /// Load a specific version, from:
    /// - the in-memory tier (if already loaded)
    /// - the on-disk tier (if previously fetched)
    /// - the remote source otherwise
    async fn load(&self, version: &str) -> Result<Arc<Self::Engine>, CacheError>;

    /// Drop the in-memory entry for `version`; files on disk are kept
    fn free(&self, version: &str);

    /// Drop every in-memory entry; files on disk are kept
    fn clear(&self);

    /// Clear the in-memory tier and remove every cached file from disk
    async fn purge(&self) -> Result<(), CacheError>;

    /// Root of the on-disk tier, `None` for caches without one
    fn path(&self) -> Option<&Path>;
}

/// Encode an identifier into a filesystem-safe file name component.
///
/// ASCII alphanumerics, `.`, `-` and `_` are kept; every other byte becomes `%XX`.
pub fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}

/// Engine cache with three tiers: memory, disk and a remote source
pub struct TieredCache<L: EngineLoader> {
    root: PathBuf,
    stem: String,
    source: Arc<dyn ArtifactSource>,
    loader: L,
    memory: Mutex<HashMap<String, Arc<L::Engine>>>,
}

impl<L: EngineLoader> TieredCache<L> {
    /// Creates a cache rooted at `directory/version-floor-cache`.
    ///
    /// Artifacts are named `<encoded stem>-<encoded version>.<extension>`. Nothing is
    /// created on disk until the first fetch.
    pub fn new(
        directory: &Path,
        stem: &str,
        source: Arc<dyn ArtifactSource>,
        loader: L,
    ) -> Self {
        Self {
            root: directory.join(CACHE_DIR_NAME),
            stem: encode_key(stem),
            source,
            loader,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Deterministic on-disk location of the artifact for `version`
    pub fn artifact_path(&self, version: &str) -> PathBuf {
        self.root.join(format!(
            "{}-{}.{}",
            self.stem,
            encode_key(version),
            L::ARTIFACT_EXTENSION
        ))
    }

    /// Versions currently resident in memory
    pub fn resident(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.memory().keys().cloned().collect();
        versions.sort();
        versions
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, Arc<L::Engine>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the artifact from disk, fetching and persisting it when absent
    async fn read_or_fetch(&self, version: &str, path: &Path) -> Result<Vec<u8>, CacheError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!("Disk hit for {} at {:?}", version, path);
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let bytes = self.source.fetch(version).await?;
                Self::persist(path, &bytes).await?;
                info!("Cached {} ({} bytes) at {:?}", version, bytes.len(), path);
                Ok(bytes)
            }
            Err(e) => Err(CacheError::filesystem(path, e)),
        }
    }

    /// Write through a sibling temporary file so a partial download never
    /// becomes a valid artifact
    async fn persist(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::filesystem(parent, e))?;
        }

        let partial = path.with_extension("part");
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| CacheError::filesystem(&partial, e))?;
        tokio::fs::rename(&partial, path)
            .await
            .map_err(|e| CacheError::filesystem(path, e))
    }
}

#[async_trait::async_trait]
impl<L: EngineLoader> EngineCache for TieredCache<L> {
    type Engine = L::Engine;

    async fn load(&self, version: &str) -> Result<Arc<L::Engine>, CacheError> {
        let cached = self.memory().get(version).cloned();
        if let Some(engine) = cached {
            debug!("Memory hit for {}", version);
            return Ok(engine);
        }

        let path = self.artifact_path(version);
        let bytes = self.read_or_fetch(version, &path).await?;
        let engine = Arc::new(self.loader.instantiate(version, &path, &bytes)?);

        self.memory()
            .insert(version.to_string(), Arc::clone(&engine));
        Ok(engine)
    }

    fn free(&self, version: &str) {
        if self.memory().remove(version).is_some() {
            debug!("Freed {} from memory", version);
        }
    }

    fn clear(&self) {
        self.memory().clear();
    }

    async fn purge(&self) -> Result<(), CacheError> {
        self.clear();
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                info!("Removed cache directory {:?}", self.root);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::filesystem(&self.root, e)),
        }
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.root)
    }
}
