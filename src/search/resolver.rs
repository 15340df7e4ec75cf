//! Minimum version resolution
//!
//! Drives a [`Sequencer`] over a sorted candidate list, asking an [`Evaluate`]
//! implementation for each visited candidate and keeping the smallest
//! candidate that passed.

use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::search::sequencer::Sequencer;
use crate::search::verdict::{Evaluate, Verdict};

/// How an undetermined verdict is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    /// Count the candidate as failing and keep searching
    #[default]
    FailClosed,
    /// Stop the whole run with [`ResolveError::Undetermined`]
    Abort,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Could not evaluate {candidate}: {reason}")]
    Undetermined { candidate: String, reason: String },
}

/// One visited candidate and its verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub candidate: String,
    pub verdict: Verdict,
}

impl Evaluation {
    /// Whether this evaluation counted as passing
    pub fn passed(&self) -> bool {
        self.verdict.is_compatible()
    }
}

/// Outcome of a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Smallest candidate with a passing verdict, if any
    pub minimum: Option<String>,
    /// Every visited candidate, in visit order
    pub evaluations: Vec<Evaluation>,
}

#[derive(Default)]
struct Progress {
    minimum: Option<usize>,
    evaluations: Vec<Evaluation>,
}

pub struct Resolver<S: Sequencer> {
    sequencer: S,
    policy: ErrorPolicy,
}

impl<S: Sequencer> Resolver<S> {
    pub fn new(sequencer: S, policy: ErrorPolicy) -> Self {
        Self { sequencer, policy }
    }

    /// Find the smallest candidate accepted by `evaluator`.
    ///
    /// `candidates` must be sorted ascending and free of duplicates.
    pub async fn resolve<V: Evaluate + ?Sized>(
        &self,
        candidates: &[String],
        evaluator: &V,
    ) -> Result<Resolution, ResolveError> {
        let positions: Vec<usize> = (0..candidates.len()).collect();
        let progress = Mutex::new(Progress::default());
        let progress_ref = &progress;
        let policy = self.policy;

        self.sequencer
            .run(positions.as_slice(), move |&index| async move {
                let candidate = &candidates[index];
                let verdict = evaluator.evaluate(candidate).await;

                if let (Verdict::Undetermined(reason), ErrorPolicy::Abort) = (&verdict, policy) {
                    return Err(ResolveError::Undetermined {
                        candidate: candidate.clone(),
                        reason: reason.clone(),
                    });
                }

                let passed = verdict.is_compatible();
                match &verdict {
                    Verdict::Undetermined(reason) => {
                        warn!("Treating {} as failing: {}", candidate, reason)
                    }
                    _ => info!("{} is {}", candidate, verdict),
                }

                let mut progress = progress_ref.lock().unwrap_or_else(PoisonError::into_inner);
                if passed {
                    progress.minimum = Some(progress.minimum.map_or(index, |m| m.min(index)));
                }
                progress.evaluations.push(Evaluation {
                    candidate: candidate.clone(),
                    verdict,
                });
                Ok(passed)
            })
            .await?;

        let progress = progress.into_inner().unwrap_or_else(PoisonError::into_inner);
        Ok(Resolution {
            minimum: progress.minimum.map(|index| candidates[index].clone()),
            evaluations: progress.evaluations,
        })
    }
}
