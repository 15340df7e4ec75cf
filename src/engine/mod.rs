//! Engine layer: tiered caching and checking of versioned compiler engines
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Evaluator  │────▶│    Cache    │────▶│   Source    │
//! │ (verdicts)  │     │(memory/disk)│     │    (CDN)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   Checker   │
//! │    (tsc)    │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: `EngineCache` trait and the memory → disk → remote `TieredCache`
//! - [`memory`]: Pre-seeded, memory-only cache
//! - [`source`]: Trait for fetching raw artifacts
//! - [`sources`]: Concrete sources (CDN)
//! - [`tsc`]: TypeScript compiler bundles, their source, loader and checker
//! - [`evaluator`]: Loads, checks and frees one candidate at a time
//! - [`error`]: Error types for cache and check operations

pub mod cache;
pub mod error;
pub mod evaluator;
pub mod memory;
pub mod source;
pub mod sources;
pub mod tsc;
