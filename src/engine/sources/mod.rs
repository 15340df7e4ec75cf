//! Artifact source implementations

pub mod cdn;

pub use cdn::CdnSource;
