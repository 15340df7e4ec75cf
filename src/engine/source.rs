//! Source trait for fetching raw engine artifacts from a remote location

#[cfg(test)]
use mockall::automock;

use crate::engine::error::CacheError;

/// Trait for fetching the raw bytes of one engine version
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetches the artifact for `version`
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The raw artifact bytes
    /// * `Err(CacheError::Fetch)` - If the source reports a non-success outcome
    async fn fetch(&self, version: &str) -> Result<Vec<u8>, CacheError>;
}
