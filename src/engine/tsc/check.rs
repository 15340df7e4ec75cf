use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::engine::error::CheckError;
use crate::engine::tsc::TscEngine;
use crate::input::Documents;

/// Default JavaScript runtime used to execute the compiler
pub const DEFAULT_NODE: &str = "node";

/// Compiler flags used when none are configured
pub const DEFAULT_COMPILER_ARGS: &[&str] = &[
    "--noEmit",
    "--pretty",
    "false",
    "--target",
    "es5",
    "--lib",
    "es5",
];

/// Workspace directory holding the unpacked compiler bundle
const COMPILER_DIR: &str = ".typescript";

/// File name of the unpacked compiler script
const COMPILER_SCRIPT: &str = "tsc.cjs";

static DIAGNOSTIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\): )?error (?P<code>TS\d+): (?P<message>.*)$",
    )
    .expect("diagnostic pattern is valid")
});

/// A single compiler diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the diagnostic points at; `None` for global or option diagnostics
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub code: String,
    pub message: String,
}

/// Parse diagnostics from `tsc --pretty false` output
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| DIAGNOSTIC_RE.captures(line.trim_end()))
        .map(|caps| Diagnostic {
            file: caps.name("file").map(|m| m.as_str().to_string()),
            line: caps.name("line").and_then(|m| m.as_str().parse().ok()),
            column: caps.name("column").and_then(|m| m.as_str().parse().ok()),
            code: caps["code"].to_string(),
            message: caps["message"].to_string(),
        })
        .collect()
}

/// Runs a compatibility check of the input documents against a loaded engine
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    type Engine: Send + Sync;

    /// Returns every diagnostic reported for `documents`
    async fn check(
        &self,
        engine: &Self::Engine,
        documents: &Documents,
    ) -> Result<Vec<Diagnostic>, CheckError>;
}

/// Checks documents by running the compiler script in a child process
pub struct TscChecker {
    node: PathBuf,
    args: Vec<String>,
}

impl TscChecker {
    pub fn new(node: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            node: node.into(),
            args,
        }
    }
}

impl Default for TscChecker {
    fn default() -> Self {
        Self::new(
            DEFAULT_NODE,
            DEFAULT_COMPILER_ARGS.iter().map(|a| a.to_string()).collect(),
        )
    }
}

#[async_trait::async_trait]
impl Checker for TscChecker {
    type Engine = TscEngine;

    async fn check(
        &self,
        engine: &TscEngine,
        documents: &Documents,
    ) -> Result<Vec<Diagnostic>, CheckError> {
        // Isolated environment, removed when `workspace` is dropped
        let workspace = tempfile::tempdir()?;
        for (relative, content) in documents {
            let path = workspace.path().join(relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content).await?;
        }

        // The compiler looks up its default libraries in its own directory
        let bundle = engine.bundle();
        let compiler_dir = workspace.path().join(COMPILER_DIR);
        tokio::fs::create_dir_all(&compiler_dir).await?;
        let script = compiler_dir.join(COMPILER_SCRIPT);
        tokio::fs::write(&script, &bundle.compiler).await?;
        for (name, content) in &bundle.libs {
            tokio::fs::write(compiler_dir.join(name), content).await?;
        }

        debug!(
            "Checking {} document(s) with TypeScript {} from {:?}",
            documents.len(),
            engine.version(),
            engine.artifact()
        );

        let output = Command::new(&self.node)
            .arg(&script)
            .args(&self.args)
            .args(documents.keys())
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CheckError::Spawn {
                program: self.node.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let diagnostics = parse_diagnostics(&stdout);

        if diagnostics.is_empty() && !output.status.success() {
            return Err(CheckError::Crashed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(diagnostics)
    }
}
