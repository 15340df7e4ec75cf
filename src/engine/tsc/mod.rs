//! TypeScript compiler engine
//!
//! An engine artifact is a [`CompilerBundle`]: the standalone compiler script
//! shipped in the `typescript` package together with the default library
//! files it loads from its own directory. A check unpacks the bundle and the
//! input documents into a temporary directory and runs the compiler there
//! with a JavaScript runtime.

mod check;
mod source;

pub use check::{
    Checker, DEFAULT_COMPILER_ARGS, DEFAULT_NODE, Diagnostic, TscChecker, parse_diagnostics,
};
pub use source::{CompilerSource, DEFAULT_LIBS};

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::cache::EngineLoader;
use crate::engine::error::CacheError;

/// Scripts at most this long that require a sibling module are launcher shims
const SHIM_MAX_LEN: usize = 4096;

static RELATIVE_REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"require\(\s*["']\.{1,2}/"#).expect("require pattern is valid")
});

/// Compiler script plus the library files it resolves next to itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerBundle {
    pub compiler: String,
    /// Library files keyed by file name, e.g. `lib.es5.d.ts`
    pub libs: IndexMap<String, String>,
}

impl CompilerBundle {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// A loaded compiler for one TypeScript version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TscEngine {
    version: String,
    artifact: PathBuf,
    bundle: CompilerBundle,
}

impl TscEngine {
    pub fn new(version: &str, artifact: &Path, bundle: CompilerBundle) -> Self {
        Self {
            version: version.to_string(),
            artifact: artifact.to_path_buf(),
            bundle,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Cached bundle this engine was loaded from
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn bundle(&self) -> &CompilerBundle {
        &self.bundle
    }
}

/// Instantiates [`TscEngine`]s from cached compiler bundles
#[derive(Debug, Clone, Copy, Default)]
pub struct TscLoader;

impl EngineLoader for TscLoader {
    type Engine = TscEngine;
    const ARTIFACT_EXTENSION: &'static str = "json";

    fn instantiate(
        &self,
        version: &str,
        artifact: &Path,
        bytes: &[u8],
    ) -> Result<TscEngine, CacheError> {
        let load_error = |reason: String| CacheError::Load {
            version: version.to_string(),
            reason,
        };

        let bundle: CompilerBundle =
            serde_json::from_slice(bytes).map_err(|e| load_error(e.to_string()))?;

        let compiler = &bundle.compiler;
        if compiler.trim().is_empty() {
            return Err(load_error("compiler script is empty".to_string()));
        }
        // A shim cannot run once cached alone, away from the module it loads
        if compiler.len() <= SHIM_MAX_LEN && RELATIVE_REQUIRE_RE.is_match(compiler) {
            return Err(load_error(
                "compiler script is a shim loading a sibling module, not a standalone compiler"
                    .to_string(),
            ));
        }
        if let Some(name) = bundle.libs.keys().find(|name| !is_lib_file_name(name)) {
            return Err(load_error(format!("invalid library file name {:?}", name)));
        }

        Ok(TscEngine::new(version, artifact, bundle))
    }
}

/// Library files are unpacked next to the compiler, so only plain
/// declaration file names are accepted
fn is_lib_file_name(name: &str) -> bool {
    name.ends_with(".d.ts") && !name.starts_with('.') && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cache::{EngineCache, TieredCache};
    use crate::engine::source::MockArtifactSource;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn bundle(compiler: &str, libs: &[(&str, &str)]) -> CompilerBundle {
        CompilerBundle {
            compiler: compiler.to_string(),
            libs: libs
                .iter()
                .map(|(name, content)| (name.to_string(), content.to_string()))
                .collect(),
        }
    }

    const SHIM: &str = concat!(
        "#!/usr/bin/env node\n",
        "try {\n",
        "  const { enableCompileCache } = require(\"node:module\");\n",
        "  if (enableCompileCache) { enableCompileCache(); }\n",
        "} catch {}\n",
        "module.exports = require(\"./_tsc.js\");\n",
    );

    #[test]
    fn loader_reads_bundle() {
        let path = Path::new("/tmp/typescript-5.0.0.json");
        let expected = bundle("var ts = {};", &[("lib.es5.d.ts", "interface Array<T> {}")]);

        let engine = TscLoader
            .instantiate("5.0.0", path, &expected.to_bytes().unwrap())
            .unwrap();

        assert_eq!(engine, TscEngine::new("5.0.0", path, expected));
    }

    #[test]
    fn loader_rejects_malformed_and_empty_bundles() {
        let path = Path::new("/tmp/typescript-5.0.0.json");

        assert!(matches!(
            TscLoader.instantiate("5.0.0", path, b"var ts = {};"),
            Err(CacheError::Load { .. })
        ));
        assert!(matches!(
            TscLoader.instantiate("5.0.0", path, &bundle("  \n", &[]).to_bytes().unwrap()),
            Err(CacheError::Load { .. })
        ));
    }

    #[test]
    fn loader_rejects_launcher_shim() {
        let path = Path::new("/tmp/typescript-5.7.2.json");

        let result = TscLoader.instantiate("5.7.2", path, &bundle(SHIM, &[]).to_bytes().unwrap());

        assert!(matches!(
            result,
            Err(CacheError::Load { ref version, ref reason })
                if version == "5.7.2" && reason.contains("shim")
        ));
    }

    #[test]
    fn loader_accepts_standalone_compiler_mentioning_relative_requires() {
        let path = Path::new("/tmp/typescript-5.7.2.json");
        let mut script =
            String::from("var ts = {};\n// require(\"./lib\") in a diagnostic message\n");
        script.push_str(&"ts.noop = function () {};\n".repeat(SHIM_MAX_LEN / 8));

        let bytes = bundle(&script, &[]).to_bytes().unwrap();

        assert!(TscLoader.instantiate("5.7.2", path, &bytes).is_ok());
    }

    #[test]
    fn loader_rejects_library_names_escaping_the_compiler_directory() {
        let path = Path::new("/tmp/typescript-5.0.0.json");
        let bytes = bundle("var ts = {};", &[("../index.d.ts", "")])
            .to_bytes()
            .unwrap();

        assert!(matches!(
            TscLoader.instantiate("5.0.0", path, &bytes),
            Err(CacheError::Load { .. })
        ));
    }

    #[tokio::test]
    async fn cached_shim_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let mut source = MockArtifactSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(bundle(SHIM, &[]).to_bytes().unwrap()));
        let cache = TieredCache::new(dir.path(), "typescript", Arc::new(source), TscLoader);

        let first = cache.load("5.7.2").await;
        let second = cache.load("5.7.2").await;

        assert!(matches!(first, Err(CacheError::Load { .. })));
        assert!(matches!(second, Err(CacheError::Load { .. })));
    }
}
