//! Outcome of evaluating a single candidate

use std::fmt;

use crate::engine::tsc::Diagnostic;

/// Result of checking the input documents against one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The check ran and reported no diagnostics
    Compatible,
    /// The check ran and reported at least one diagnostic
    Incompatible(Vec<Diagnostic>),
    /// The check could not complete (fetch, load or runtime failure)
    Undetermined(String),
}

impl Verdict {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Verdict::Compatible)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Compatible => write!(f, "compatible"),
            Verdict::Incompatible(diagnostics) => {
                write!(f, "{} diagnostic(s)", diagnostics.len())
            }
            Verdict::Undetermined(reason) => write!(f, "undetermined: {}", reason),
        }
    }
}

/// Produces a verdict for one candidate
#[async_trait::async_trait]
pub trait Evaluate: Send + Sync {
    async fn evaluate(&self, candidate: &str) -> Verdict;
}
