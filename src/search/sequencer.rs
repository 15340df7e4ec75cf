//! Traversal strategies over an ordered candidate list

use std::future::Future;

use tracing::debug;

/// Strategy deciding which candidates to evaluate and in which order.
///
/// `predicate` is awaited one candidate at a time. An `Err` returned by the
/// predicate aborts the run immediately and is returned to the caller.
/// Sequencers report nothing besides completion: the caller observes the
/// verdicts through its predicate.
#[allow(async_fn_in_trait)]
pub trait Sequencer {
    async fn run<T, F, Fut, E>(&self, items: &[T], predicate: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Fut,
        Fut: Future<Output = Result<bool, E>>;
}

/// Visits every candidate in its original order, ignoring verdicts
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialSequencer;

impl Sequencer for SequentialSequencer {
    async fn run<T, F, Fut, E>(&self, items: &[T], mut predicate: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        for item in items {
            predicate(item).await?;
        }
        Ok(())
    }
}

/// Binary search for the smallest candidate satisfying a monotonic predicate.
///
/// Assumes the predicate is false below some threshold index and true at and
/// above it. A true verdict continues the search to the left of `mid`, a false
/// one to the right. When the predicate is not monotonic the search still
/// terminates after O(log n) evaluations, but the smallest passing candidate it
/// observed is not necessarily the smallest passing one overall.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinarySearchSequencer;

impl Sequencer for BinarySearchSequencer {
    async fn run<T, F, Fut, E>(&self, items: &[T], mut predicate: F) -> Result<(), E>
    where
        F: FnMut(&T) -> Fut,
        Fut: Future<Output = Result<bool, E>>,
    {
        if items.is_empty() {
            return Ok(());
        }

        let mut left = 0;
        let mut right = items.len() - 1;
        while left <= right {
            let mid = left + (right - left) / 2;
            let valid = predicate(&items[mid]).await?;
            debug!("Bisect [{}, {}] mid={} valid={}", left, right, mid, valid);

            if valid {
                // Look for a smaller satisfying candidate
                if mid == 0 {
                    break;
                }
                right = mid - 1;
            } else {
                left = mid + 1;
            }
        }
        Ok(())
    }
}
