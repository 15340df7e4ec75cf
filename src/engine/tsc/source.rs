use std::collections::VecDeque;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use crate::engine::error::CacheError;
use crate::engine::source::ArtifactSource;
use crate::engine::sources::CdnSource;
use crate::engine::tsc::CompilerBundle;

/// Libraries fetched with every compiler, matching `--lib es5`
pub const DEFAULT_LIBS: &[&str] = &["es5"];

/// Package directory holding the library files
const LIB_DIR: &str = "lib";

static REFERENCE_LIB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*///\s*<reference\s+lib\s*=\s*"([^"]+)"\s*/>"#)
        .expect("reference pattern is valid")
});

/// Fetches a compiler from the CDN and bundles it with the library files it
/// needs: the configured libraries and every library they reference through
/// `/// <reference lib="..." />` directives
pub struct CompilerSource {
    cdn: CdnSource,
    libs: Vec<String>,
}

impl CompilerSource {
    pub fn new<I, S>(cdn: CdnSource, libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            cdn,
            libs: libs.into_iter().map(|lib| lib.as_ref().to_string()).collect(),
        }
    }
}

/// `es2015.Promise` is shipped as `lib.es2015.promise.d.ts`
fn lib_file_name(lib: &str) -> String {
    format!("lib.{}.d.ts", lib.to_lowercase())
}

fn utf8(version: &str, file: &str, bytes: Vec<u8>) -> Result<String, CacheError> {
    String::from_utf8(bytes).map_err(|e| CacheError::Fetch {
        version: version.to_string(),
        reason: format!("{} is not UTF-8: {}", file, e),
    })
}

#[async_trait::async_trait]
impl ArtifactSource for CompilerSource {
    async fn fetch(&self, version: &str) -> Result<Vec<u8>, CacheError> {
        let compiler = utf8(version, "compiler", self.cdn.fetch(version).await?)?;

        let mut libs = IndexMap::new();
        let mut pending: VecDeque<String> =
            self.libs.iter().map(|lib| lib_file_name(lib)).collect();
        while let Some(name) = pending.pop_front() {
            if libs.contains_key(&name) {
                continue;
            }

            let file = format!("{}/{}", LIB_DIR, name);
            let bytes = self
                .cdn
                .fetch_file(version, &file)
                .await?
                .ok_or_else(|| CacheError::Fetch {
                    version: version.to_string(),
                    reason: format!("Not found: {}", file),
                })?;
            let content = utf8(version, &file, bytes)?;

            for caps in REFERENCE_LIB_RE.captures_iter(&content) {
                debug!("{} references {}", name, &caps[1]);
                pending.push_back(lib_file_name(&caps[1]));
            }
            libs.insert(name, content);
        }

        CompilerBundle { compiler, libs }
            .to_bytes()
            .map_err(|e| CacheError::Fetch {
                version: version.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sources::cdn::DEFAULT_FILES;
    use mockito::{Mock, Server, ServerGuard};

    async fn serve(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn fetch_bundles_compiler_with_referenced_libraries() {
        let mut server = Server::new_async().await;
        let missing = server
            .mock("GET", "/typescript@5.0.4/lib/_tsc.js")
            .with_status(404)
            .create_async()
            .await;
        let compiler = serve(&mut server, "/typescript@5.0.4/lib/tsc.js", "var ts = {};").await;
        let es5 = serve(
            &mut server,
            "/typescript@5.0.4/lib/lib.es5.d.ts",
            concat!(
                "/// <reference no-default-lib=\"true\"/>\n",
                "/// <reference lib=\"decorators\" />\n",
                "/// <reference lib=\"decorators.legacy\" />\n",
                "interface Array<T> {}\n",
            ),
        )
        .await;
        let decorators = serve(
            &mut server,
            "/typescript@5.0.4/lib/lib.decorators.d.ts",
            "interface ClassDecoratorContext {}",
        )
        .await;
        let legacy = serve(
            &mut server,
            "/typescript@5.0.4/lib/lib.decorators.legacy.d.ts",
            "/// <reference lib=\"decorators\" />\ndeclare type ClassDecorator = any;",
        )
        .await;

        let cdn = CdnSource::new(&server.url(), "typescript", DEFAULT_FILES);
        let source = CompilerSource::new(cdn, DEFAULT_LIBS);
        let bytes = source.fetch("5.0.4").await.unwrap();

        for mock in [&missing, &compiler, &es5, &decorators, &legacy] {
            mock.assert_async().await;
        }
        let bundle: CompilerBundle = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(bundle.compiler, "var ts = {};");
        assert_eq!(
            bundle.libs.keys().collect::<Vec<_>>(),
            vec![
                "lib.es5.d.ts",
                "lib.decorators.d.ts",
                "lib.decorators.legacy.d.ts"
            ]
        );
    }

    #[tokio::test]
    async fn fetch_fails_when_a_library_is_missing() {
        let mut server = Server::new_async().await;
        let _compiler = serve(&mut server, "/typescript@4.0.2/lib/_tsc.js", "var ts = {};").await;
        let _lib = server
            .mock("GET", "/typescript@4.0.2/lib/lib.es5.d.ts")
            .with_status(404)
            .create_async()
            .await;

        let cdn = CdnSource::new(&server.url(), "typescript", DEFAULT_FILES);
        let result = CompilerSource::new(cdn, DEFAULT_LIBS).fetch("4.0.2").await;

        assert!(matches!(
            result,
            Err(CacheError::Fetch { ref reason, .. }) if reason.contains("lib/lib.es5.d.ts")
        ));
    }

    #[test]
    fn lib_names_map_to_lowercase_file_names() {
        assert_eq!(lib_file_name("es5"), "lib.es5.d.ts");
        assert_eq!(lib_file_name("ES2015.Promise"), "lib.es2015.promise.d.ts");
    }
}
