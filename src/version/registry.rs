//! Registry trait for fetching the published versions of a package

use crate::version::error::RegistryError;

/// Trait for fetching package versions from a registry
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Fetches all versions for a package from the registry
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "typescript")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Valid semver versions, ordered from oldest to newest
    /// * `Err(RegistryError)` - If the fetch fails
    async fn fetch_all_versions(&self, package_name: &str) -> Result<Vec<String>, RegistryError>;
}
