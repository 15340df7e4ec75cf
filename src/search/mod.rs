//! Search layer: traversal strategies and minimum version resolution
//!
//! - [`sequencer`]: Sequential and binary search traversal strategies
//! - [`resolver`]: Drives a sequencer and tracks the smallest passing candidate
//! - [`verdict`]: Per-candidate evaluation outcome and the [`verdict::Evaluate`] trait

pub mod resolver;
pub mod sequencer;
pub mod verdict;
