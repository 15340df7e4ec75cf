//! Candidate version layer
//!
//! Fetches the published versions of the engine package and narrows them to
//! the sorted candidate list searched by the resolver.
//!
//! # Modules
//!
//! - [`registry`]: Registry trait for fetching versions from remote sources
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`filter`]: Pre-release and bound filtering of published versions
//! - [`error`]: Error types for registry and filter operations
//! - [`semver`]: Shared semver utilities

pub mod error;
pub mod filter;
pub mod registries;
pub mod registry;
pub mod semver;
