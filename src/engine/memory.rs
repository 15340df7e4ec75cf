//! Memory-only engine cache, used as a substitute in tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::cache::EngineCache;
use crate::engine::error::CacheError;

/// Engine cache backed only by a pre-seeded map.
///
/// There is no disk or network tier: a miss fails with [`CacheError::NotFound`].
pub struct MemoryCache<E> {
    memory: Mutex<HashMap<String, Arc<E>>>,
}

impl<E> MemoryCache<E> {
    pub fn new<I, V>(engines: I) -> Self
    where
        I: IntoIterator<Item = (V, E)>,
        V: Into<String>,
    {
        let memory = engines
            .into_iter()
            .map(|(version, engine)| (version.into(), Arc::new(engine)))
            .collect();
        Self {
            memory: Mutex::new(memory),
        }
    }

    /// Number of resident engines
    pub fn len(&self) -> usize {
        self.memory().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, Arc<E>>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E> Default for MemoryCache<E> {
    fn default() -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl<E: Send + Sync> EngineCache for MemoryCache<E> {
    type Engine = E;

    async fn load(&self, version: &str) -> Result<Arc<E>, CacheError> {
        self.memory()
            .get(version)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(version.to_string()))
    }

    fn free(&self, version: &str) {
        self.memory().remove(version);
    }

    fn clear(&self) {
        self.memory().clear();
    }

    async fn purge(&self) -> Result<(), CacheError> {
        self.clear();
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}
