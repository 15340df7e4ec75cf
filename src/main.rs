use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use version_floor::config::{self, Config, Strategy};
use version_floor::engine::cache::{EngineCache, TieredCache};
use version_floor::engine::evaluator::Evaluator;
use version_floor::engine::sources::CdnSource;
use version_floor::engine::tsc::{CompilerSource, TscChecker, TscLoader};
use version_floor::input::{DOCUMENT_SUFFIX, collect_documents};
use version_floor::search::resolver::{ErrorPolicy, Resolution, Resolver};
use version_floor::search::sequencer::{BinarySearchSequencer, SequentialSequencer};
use version_floor::version::registries::NpmRegistry;
use version_floor::version::registry::Registry;

#[derive(Parser)]
#[command(name = "version-floor")]
#[command(
    version,
    about = "Find the minimum TypeScript version your declaration files compile against"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// A .d.ts file, or a directory searched recursively for .d.ts files
    path: Option<PathBuf>,

    /// Print every evaluated version with its result
    #[arg(long, global = true)]
    verbose: bool,

    /// How candidate versions are traversed
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// What to do when a version cannot be evaluated
    #[arg(long, value_enum)]
    on_error: Option<OnErrorArg>,

    /// Include -dev pre-releases
    #[arg(long)]
    include_dev: bool,

    /// Include -insiders pre-releases
    #[arg(long)]
    include_insiders: bool,

    /// Include -beta pre-releases
    #[arg(long)]
    include_beta: bool,

    /// Include -rc pre-releases
    #[arg(long)]
    include_rc: bool,

    /// Lowest version to consider (inclusive)
    #[arg(long)]
    min_version: Option<String>,

    /// Highest version to consider (inclusive)
    #[arg(long)]
    max_version: Option<String>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory under which downloaded compilers are cached
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Write logs to FILE instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Write logs to version-floor.log in the data directory instead of stderr
    #[arg(long, global = true, conflicts_with = "log_file")]
    log: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect or remove the compiler cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cache directory
    Path,
    /// Remove every cached compiler from disk
    Purge,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Binary,
    Sequential,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnErrorArg {
    Fail,
    Abort,
}

impl Cli {
    /// Load the configuration file, then apply command line overrides
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(directory) = &self.cache_dir {
            config.cache.directory = directory.clone();
        }
        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                StrategyArg::Binary => Strategy::Binary,
                StrategyArg::Sequential => Strategy::Sequential,
            };
        }
        if let Some(on_error) = self.on_error {
            config.on_error = match on_error {
                OnErrorArg::Fail => ErrorPolicy::FailClosed,
                OnErrorArg::Abort => ErrorPolicy::Abort,
            };
        }

        let filter = &mut config.filter;
        filter.include_dev |= self.include_dev;
        filter.include_insiders |= self.include_insiders;
        filter.include_beta |= self.include_beta;
        filter.include_rc |= self.include_rc;
        if let Some(min) = &self.min_version {
            filter.min_version = min.clone();
        }
        if let Some(max) = &self.max_version {
            filter.max_version = Some(max.clone());
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().or_else(|| cli.log.then(config::log_path));
    let _guard = version_floor::logging::init(cli.verbose, cli.log_json, log_file.as_deref())?;

    let config = cli.config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match (&cli.command, &cli.path) {
        (Some(Command::Cache { action }), _) => runtime.block_on(cache(action, &config)),
        (None, Some(path)) => runtime.block_on(run(path, &config, cli.verbose)),
        (None, None) => bail!("Usage: version-floor [--verbose] <fileOrDir>"),
    }
}

fn tiered_cache(config: &Config) -> TieredCache<TscLoader> {
    let cdn = CdnSource::new(&config.cdn.url, &config.registry.package, &config.cdn.files);
    let source = CompilerSource::new(cdn, &config.cdn.libs);
    TieredCache::new(
        &config.cache.directory,
        &config.registry.package,
        Arc::new(source),
        TscLoader,
    )
}

async fn cache(action: &CacheAction, config: &Config) -> anyhow::Result<()> {
    let cache = tiered_cache(config);
    let root = cache
        .path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(in-memory)".to_string());

    match action {
        CacheAction::Path => println!("{}", root),
        CacheAction::Purge => {
            cache.purge().await?;
            println!("Removed {}", root);
        }
    }
    Ok(())
}

async fn run(path: &Path, config: &Config, verbose: bool) -> anyhow::Result<()> {
    let documents = collect_documents(path)?;
    if documents.is_empty() {
        bail!("No {} files found in {}", DOCUMENT_SUFFIX, path.display());
    }

    let registry = NpmRegistry::new(&config.registry.url);
    let published = registry
        .fetch_all_versions(&config.registry.package)
        .await
        .with_context(|| format!("Failed to fetch {} versions", config.registry.package))?;
    let candidates = config.filter.apply(published)?;
    info!(
        "Searching {} candidate version(s) for {} document(s)",
        candidates.len(),
        documents.len()
    );

    let checker = TscChecker::new(config.check.node.clone(), config.check.args.clone());
    let evaluator = Evaluator::new(Arc::new(tiered_cache(config)), checker, documents);

    let resolution = match config.strategy {
        Strategy::Binary => {
            Resolver::new(BinarySearchSequencer, config.on_error)
                .resolve(&candidates, &evaluator)
                .await?
        }
        Strategy::Sequential => {
            Resolver::new(SequentialSequencer, config.on_error)
                .resolve(&candidates, &evaluator)
                .await?
        }
    };

    report(&resolution, verbose);
    Ok(())
}

fn report(resolution: &Resolution, verbose: bool) {
    print!("{}", render(resolution, verbose));
}

/// Report text; with no passing candidate the minimum is `none`
fn render(resolution: &Resolution, verbose: bool) -> String {
    let mut out = String::new();
    if verbose {
        for evaluation in &resolution.evaluations {
            let marker = if evaluation.passed() { "✅" } else { "❌" };
            out.push_str(&format!("{} {}\n", marker, evaluation.candidate));
        }
    }
    out.push_str(&format!(
        "Minimum TypeScript version: {}\n",
        resolution.minimum.as_deref().unwrap_or("none")
    ));
    out
}
