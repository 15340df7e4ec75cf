//! Binds the compatibility check to the engine cache

use std::sync::Arc;

use tracing::error;

use crate::engine::cache::EngineCache;
use crate::engine::tsc::{Checker, Diagnostic};
use crate::input::Documents;
use crate::search::verdict::{Evaluate, Verdict};

/// Evaluates candidates by loading their engine and checking the documents.
///
/// Every evaluation frees the candidate from the cache's memory tier once it
/// is done, so a run keeps at most one engine resident at a time.
pub struct Evaluator<C, K> {
    cache: Arc<C>,
    checker: K,
    documents: Documents,
}

impl<C, K> Evaluator<C, K>
where
    C: EngineCache,
    K: Checker<Engine = C::Engine>,
{
    pub fn new(cache: Arc<C>, checker: K, documents: Documents) -> Self {
        Self {
            cache,
            checker,
            documents,
        }
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    async fn diagnostics(&self, version: &str) -> Result<Vec<Diagnostic>, String> {
        let engine = self.cache.load(version).await.map_err(|e| e.to_string())?;
        self.checker
            .check(&engine, &self.documents)
            .await
            .map_err(|e| e.to_string())
    }
}

/// Frees a candidate from the cache when dropped
struct Release<'a, C: EngineCache> {
    cache: &'a C,
    version: &'a str,
}

impl<C: EngineCache> Drop for Release<'_, C> {
    fn drop(&mut self) {
        self.cache.free(self.version);
    }
}

#[async_trait::async_trait]
impl<C, K> Evaluate for Evaluator<C, K>
where
    C: EngineCache,
    K: Checker<Engine = C::Engine>,
{
    async fn evaluate(&self, candidate: &str) -> Verdict {
        let _release = Release {
            cache: self.cache.as_ref(),
            version: candidate,
        };

        match self.diagnostics(candidate).await {
            Ok(diagnostics) if diagnostics.is_empty() => Verdict::Compatible,
            Ok(diagnostics) => Verdict::Incompatible(diagnostics),
            Err(reason) => {
                error!("Error testing version {}: {}", candidate, reason);
                Verdict::Undetermined(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::CheckError;
    use crate::engine::memory::MemoryCache;
    use std::path::PathBuf;

    /// Engine that reports a fixed set of diagnostics, or fails
    #[derive(Debug)]
    enum FakeEngine {
        Clean,
        Broken,
        Crashing,
        Hanging,
    }

    struct FakeChecker;

    #[async_trait::async_trait]
    impl Checker for FakeChecker {
        type Engine = FakeEngine;

        async fn check(
            &self,
            engine: &FakeEngine,
            documents: &Documents,
        ) -> Result<Vec<Diagnostic>, CheckError> {
            match engine {
                FakeEngine::Clean => Ok(Vec::new()),
                FakeEngine::Broken => Ok(documents
                    .keys()
                    .map(|path| Diagnostic {
                        file: Some(path.display().to_string()),
                        line: Some(1),
                        column: Some(1),
                        code: "TS1005".to_string(),
                        message: "';' expected.".to_string(),
                    })
                    .collect()),
                FakeEngine::Crashing => Err(CheckError::Crashed {
                    status: "exit status: 1".to_string(),
                    stderr: "boom".to_string(),
                }),
                FakeEngine::Hanging => std::future::pending().await,
            }
        }
    }

    fn evaluator() -> Evaluator<MemoryCache<FakeEngine>, FakeChecker> {
        let cache = MemoryCache::new([
            ("4.0.0", FakeEngine::Broken),
            ("5.0.0", FakeEngine::Clean),
            ("5.1.0", FakeEngine::Crashing),
            ("5.2.0", FakeEngine::Hanging),
        ]);
        let documents = Documents::from([(PathBuf::from("index.d.ts"), "export {};".to_string())]);
        Evaluator::new(Arc::new(cache), FakeChecker, documents)
    }

    #[tokio::test]
    async fn clean_check_is_compatible_and_frees_engine() {
        let evaluator = evaluator();

        assert_eq!(evaluator.evaluate("5.0.0").await, Verdict::Compatible);
        assert!(evaluator.cache().load("5.0.0").await.is_err());
        assert_eq!(evaluator.cache().len(), 3);
    }

    #[tokio::test]
    async fn diagnostics_make_candidate_incompatible() {
        let evaluator = evaluator();

        let verdict = evaluator.evaluate("4.0.0").await;

        assert!(matches!(verdict, Verdict::Incompatible(ref d) if d.len() == 1));
        assert_eq!(evaluator.cache().len(), 3);
    }

    #[tokio::test]
    async fn check_error_is_undetermined_and_still_frees() {
        let evaluator = evaluator();

        let verdict = evaluator.evaluate("5.1.0").await;

        assert!(matches!(verdict, Verdict::Undetermined(ref reason) if reason.contains("boom")));
        assert_eq!(evaluator.cache().len(), 3);
    }

    #[tokio::test]
    async fn cache_miss_is_undetermined() {
        let evaluator = evaluator();

        let verdict = evaluator.evaluate("3.0.0").await;

        assert_eq!(
            verdict,
            Verdict::Undetermined("Version 3.0.0 not in cache".to_string())
        );
        assert_eq!(evaluator.cache().len(), 4);
    }

    #[tokio::test]
    async fn dropping_pending_evaluation_frees_engine() {
        let evaluator = evaluator();

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            evaluator.evaluate("5.2.0"),
        )
        .await;

        assert!(pending.is_err());
        assert!(evaluator.cache().load("5.2.0").await.is_err());
        assert_eq!(evaluator.cache().len(), 3);
    }
}
