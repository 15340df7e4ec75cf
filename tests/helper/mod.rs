#![allow(dead_code)]

pub mod engine;

pub use engine::{CountingSource, FakeChecker, FakeEngine, TextLoader, candidates};
