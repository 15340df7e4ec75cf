//! CDN (unpkg-style) artifact source

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::engine::error::CacheError;
use crate::engine::source::ArtifactSource;

/// Default base URL for the package CDN
pub const DEFAULT_CDN_URL: &str = "https://unpkg.com";

/// Default package whose artifacts are fetched
pub const DEFAULT_PACKAGE: &str = "typescript";

/// Default files holding the standalone compiler, in lookup order.
///
/// Since TypeScript 5.7 `lib/tsc.js` is a shim loading `lib/_tsc.js`, so the
/// real compiler is tried first and older releases fall back to `lib/tsc.js`.
pub const DEFAULT_FILES: &[&str] = &["lib/_tsc.js", "lib/tsc.js"];

/// Fetches `{base_url}/{package}@{version}/{file}` for the first file the
/// CDN serves
pub struct CdnSource {
    client: reqwest::Client,
    base_url: String,
    package: String,
    files: Vec<String>,
}

impl CdnSource {
    /// Creates a new CdnSource for `package`, trying `files` in order for every version
    pub fn new<I, S>(base_url: &str, package: &str, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            client: reqwest::Client::builder()
                .user_agent("version-floor")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            package: package.to_string(),
            files: files
                .into_iter()
                .map(|file| file.as_ref().trim_start_matches('/').to_string())
                .collect(),
        }
    }

    fn artifact_url(&self, version: &str, file: &str) -> String {
        format!("{}/{}@{}/{}", self.base_url, self.package, version, file)
    }

    /// Fetch one `file` of `version`; `Ok(None)` when the CDN reports it missing
    pub async fn fetch_file(
        &self,
        version: &str,
        file: &str,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let fetch_error = |reason: String| CacheError::Fetch {
            version: version.to_string(),
            reason,
        };

        let url = self.artifact_url(version, file);
        info!("Fetching {} {} from {}", self.package, version, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} not found", url);
            return Ok(None);
        }
        if !status.is_success() {
            warn!("CDN returned status {}: {}", status, url);
            return Err(fetch_error(format!("Unexpected status: {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }
}

impl Default for CdnSource {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_URL, DEFAULT_PACKAGE, DEFAULT_FILES)
    }
}

#[async_trait::async_trait]
impl ArtifactSource for CdnSource {
    async fn fetch(&self, version: &str) -> Result<Vec<u8>, CacheError> {
        for file in &self.files {
            if let Some(bytes) = self.fetch_file(version, file).await? {
                return Ok(bytes);
            }
        }

        warn!("No artifact found for {} {}", self.package, version);
        Err(CacheError::Fetch {
            version: version.to_string(),
            reason: format!("Not found: {}", self.files.join(", ")),
        })
    }
}
