//! Find the minimum TypeScript version a set of declaration files compiles against
//!
//! # Modules
//!
//! - [`search`]: Traversal strategies and minimum version resolution
//! - [`engine`]: Tiered engine cache, compiler check and evaluator
//! - [`version`]: Candidate versions from the npm registry
//! - [`input`]: Discovery of the input documents
//! - [`config`]: Configuration file and data directories
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod engine;
pub mod input;
pub mod logging;
pub mod search;
pub mod version;
