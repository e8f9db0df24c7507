//! `scrapefrb`: discover, record and download FR Y-6 filings.

mod logging;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use logging::Console;
use scrapefrb_core::{AppConfig, SourceCode, WorkDir};
use scrapefrb_db::PersistentStore;
use scrapefrb_scanner::{HttpFetcher, Pipeline, RunContext, RunOptions, RunSummary, SourceFilter};
use scrapefrb_source::{SourceLoader, SourceRegistry};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "scrapefrb",
    about = "Scrape FR Y-6 filings from the Federal Reserve Banks of Atlanta, Chicago and St. Louis",
    version
)]
struct Cli {
    /// Working directory holding downloads/, log/ and the store
    #[arg(long, env = "SCRAPEFRB_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Download every scraped document, not only new ones
    #[arg(short = 'a', long)]
    download_all: bool,

    /// Scrape and diff only: no store inserts, run log or downloads
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Scrape, diff, insert and log, but skip downloads
    #[arg(long)]
    no_download: bool,

    /// Include the Atlanta source
    #[arg(long)]
    atlanta: bool,

    /// Include the Chicago source
    #[arg(long)]
    chicago: bool,

    /// Include the St. Louis source
    #[arg(long)]
    st_louis: bool,

    /// Suppress console output (the log file is still written)
    #[arg(short, long)]
    quiet: bool,

    /// Debug-level console logging
    #[arg(short, long)]
    verbose: bool,

    /// Alternative configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Sources named by flag, in processing order.
    fn requested_sources(&self) -> Vec<SourceCode> {
        [
            (self.atlanta, SourceCode::Atlanta),
            (self.chicago, SourceCode::Chicago),
            (self.st_louis, SourceCode::StLouis),
        ]
        .into_iter()
        .filter_map(|(on, code)| on.then_some(code))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let started_at = Utc::now();

    let config = AppConfig::load_with_env(cli.config.as_deref()).context("cannot load configuration")?;
    let root = config.resolve_workdir(cli.workdir.as_deref())?;
    let workdir = WorkDir::prepare(&root)?;

    let console = Console::from_flags(cli.quiet, cli.verbose);
    logging::init_tracing(console, &workdir.daily_log_path(started_at.date_naive()))?;

    tracing::info!("Starting scrapefrb v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!(workdir = %workdir.root().display(), "using working directory");

    let registry = match &config.sources.definitions_dir {
        Some(dir) => SourceRegistry::load_from(&SourceLoader::new(dir)?)?,
        None => SourceRegistry::builtin()?,
    };

    let sources = SourceFilter::from_flags(cli.requested_sources()).select(&config.sources.enabled);
    if sources.is_empty() {
        tracing::warn!("No sources enabled, nothing to do");
    }

    let store = PersistentStore::open(workdir.store_path())
        .await
        .with_context(|| format!("cannot open store {}", workdir.store_path().display()))?;

    let context = RunContext {
        workdir,
        store: store.clone(),
        fetcher: HttpFetcher::from_config(&config.scanning)?,
        registry,
        options: RunOptions {
            dry_run: cli.dry_run,
            no_download: cli.no_download,
            download_all: cli.download_all,
            sources,
            max_pager_rounds: config.scanning.max_pager_rounds,
            show_progress: config.download.show_progress && console != Console::Quiet,
        },
        started_at,
    };

    let result = Pipeline::new(context).run().await;
    store.close().await;
    let summary = result?;

    if console != Console::Quiet {
        print_summary(&summary);
    }
    tracing::info!(
        elapsed_secs = (Utc::now() - started_at).num_seconds(),
        "Run complete"
    );

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for source in &summary.per_source {
        match &source.error {
            Some(error) => println!(
                "  {:<36} skipped: {}",
                source.source.display_name(),
                error
            ),
            None => println!(
                "  {:<36} {} files",
                source.source.display_name(),
                source.documents
            ),
        }
    }
    println!("Scraped {} files, {} new", summary.total, summary.new);

    if let Some(insert) = &summary.insert {
        println!(
            "Stored {} new rows ({} rejected as duplicates)",
            insert.inserted, insert.rejected
        );
    }
    if let Some(download) = &summary.download {
        println!(
            "Downloaded {} files ({} already present, {} failed)",
            download.downloaded, download.skipped_existing, download.failed
        );
    }
    if let Some(path) = &summary.run_log {
        println!("Run log: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["scrapefrb", "-a", "-d", "-q", "-v"]).expect("parse flags");
        assert!(cli.download_all);
        assert!(cli.dry_run);
        assert!(cli.quiet);
        assert!(cli.verbose);
        assert!(!cli.no_download);
    }

    #[test]
    fn test_source_flags_keep_processing_order() {
        let cli = Cli::try_parse_from(["scrapefrb", "--st-louis", "--atlanta"]).expect("parse flags");
        assert_eq!(
            cli.requested_sources(),
            vec![SourceCode::Atlanta, SourceCode::StLouis]
        );
    }

    #[test]
    fn test_no_source_flags() {
        let cli = Cli::try_parse_from(["scrapefrb", "--workdir", "/tmp/frb", "--no-download"])
            .expect("parse flags");
        assert!(cli.requested_sources().is_empty());
        assert_eq!(cli.workdir, Some(PathBuf::from("/tmp/frb")));
        assert!(cli.no_download);
    }

    #[test]
    fn test_config_file_is_honoured() {
        let temp = tempfile::TempDir::new().expect("create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[scanning]\nmax_attempts = 2\nmax_pager_rounds = 10\n")
            .expect("write config");

        let cli = Cli::try_parse_from(["scrapefrb", "--config", path.to_str().expect("utf-8 path")])
            .expect("parse flags");
        let config = AppConfig::load_from(cli.config.as_deref().expect("config path"))
            .expect("load config");

        assert_eq!(config.scanning.max_attempts, 2);
        assert_eq!(config.scanning.max_pager_rounds, Some(10));
    }
}
