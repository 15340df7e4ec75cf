//! Candidate list filtering
//!
//! Narrows the published versions of a package down to the sorted,
//! deduplicated list of candidates searched by the resolver.

use semver::Version;
use serde::Deserialize;

use crate::version::error::FilterError;
use crate::version::semver::parse_version;

/// Lowest version considered unless configured otherwise
pub const DEFAULT_MIN_VERSION: &str = "4.0.0";

/// Pre-release classes and bounds applied to the published versions
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionFilter {
    pub include_dev: bool,
    pub include_insiders: bool,
    pub include_beta: bool,
    pub include_rc: bool,
    /// Inclusive lower bound
    pub min_version: String,
    /// Inclusive upper bound
    pub max_version: Option<String>,
}

impl Default for VersionFilter {
    fn default() -> Self {
        Self {
            include_dev: false,
            include_insiders: false,
            include_beta: false,
            include_rc: false,
            min_version: DEFAULT_MIN_VERSION.to_string(),
            max_version: None,
        }
    }
}

impl VersionFilter {
    /// Filter `versions`, returning them sorted ascending without duplicates.
    ///
    /// Entries that are not valid semver are dropped.
    pub fn apply<I, S>(&self, versions: I) -> Result<Vec<String>, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let min = parse_bound(&self.min_version)?;
        let max = self.max_version.as_deref().map(parse_bound).transpose()?;

        let mut kept: Vec<(Version, String)> = versions
            .into_iter()
            .map(Into::into)
            .filter_map(|raw| Version::parse(&raw).ok().map(|parsed| (parsed, raw)))
            .filter(|(parsed, _)| *parsed >= min)
            .filter(|(parsed, _)| max.as_ref().is_none_or(|max| parsed <= max))
            .filter(|(parsed, _)| self.allows_prerelease(parsed.pre.as_str()))
            .collect();

        kept.sort_by(|(a, _), (b, _)| a.cmp(b));
        kept.dedup_by(|(a, _), (b, _)| a == b);

        Ok(kept.into_iter().map(|(_, raw)| raw).collect())
    }

    fn allows_prerelease(&self, pre: &str) -> bool {
        let excluded = [
            ("dev", self.include_dev),
            ("insiders", self.include_insiders),
            ("beta", self.include_beta),
            ("rc", self.include_rc),
        ];
        excluded
            .iter()
            .all(|(class, included)| *included || !pre.contains(class))
    }
}

fn parse_bound(bound: &str) -> Result<Version, FilterError> {
    parse_version(bound).ok_or_else(|| FilterError::InvalidBound(bound.to_string()))
}
