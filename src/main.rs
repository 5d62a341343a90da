//! Site-Harvest main entry point
//!
//! This is the command-line interface for the Site-Harvest structured data extractor.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use site_harvest::config::{load_config_with_hash, Config};
use site_harvest::crawler::{Coordinator, CrawlOptions, MappingSession};
use site_harvest::fetcher::FirecrawlFetcher;
use site_harvest::output::{load_statistics, print_statistics, ExportFormat, Exporter};
use site_harvest::schema::Schema;
use site_harvest::service::{handle_infer, run_crawl, CrawlRequest, InferQuery};
use site_harvest::storage::{open_storage, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Site-Harvest: turn a website into CMS-importable records
///
/// Maps a site into a URL tree, crawls a selection of pages through an
/// external page fetcher, extracts records against a field schema, and
/// exports them for Shopify, WordPress, Webflow and other CMSes.
#[derive(Parser, Debug)]
#[command(name = "site-harvest")]
#[command(version)]
#[command(about = "Structured data extraction for CMS migration", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "site-harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover a site's URLs and start a new mapping session
    Map {
        url: String,

        /// Maximum URLs to discover
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Discover deeper URLs under one node of the latest session
    Expand {
        node_path: String,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Print the latest session's URL tree, opening only expanded nodes
    Tree,

    /// Sample a page and print the inferred schema
    Infer { url: String },

    /// Crawl selected URLs of the latest session and store the records
    Crawl {
        /// JSON schema file ({"type":"object","properties":{...}})
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Infer the schema from the first selected page when none is given
        #[arg(long)]
        auto_infer: bool,

        /// Keep raw page data in the response
        #[arg(long)]
        include_raw: bool,

        /// Maximum accepted cache age in milliseconds
        #[arg(long)]
        max_age: Option<u64>,

        /// Node path to toggle into the selection; repeatable (default: everything)
        #[arg(long = "select", value_name = "PATH")]
        select: Vec<String>,
    },

    /// Export a crawl run's records
    Export {
        #[arg(long)]
        format: ExportFormat,

        /// Records per part; produces a zip archive
        #[arg(long)]
        batch_size: Option<usize>,

        /// Batch with the configured batch size
        #[arg(long, conflicts_with = "batch_size")]
        batched: bool,

        /// Run to export (default: latest completed run)
        #[arg(long)]
        run: Option<i64>,

        /// Output directory (default: configured export dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show statistics for a crawl run
    Stats {
        /// Run to summarize (default: latest run)
        #[arg(long)]
        run: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Map { url, limit } => handle_map(&config, &config_hash, &url, limit).await,
        Command::Expand { node_path, limit } => handle_expand(&config, &node_path, limit).await,
        Command::Tree => handle_tree(&config),
        Command::Infer { url } => handle_infer_command(&config, url).await,
        Command::Crawl {
            schema,
            auto_infer,
            include_raw,
            max_age,
            select,
        } => {
            let schema = schema.as_deref().map(read_schema).transpose()?;
            let request = CrawlRequest {
                url: None,
                schema,
                auto_infer: Some(auto_infer),
                include_raw: Some(include_raw),
                selected_urls: Vec::new(),
                max_age,
            };
            handle_crawl(&config, request, &select).await
        }
        Command::Export {
            format,
            batch_size,
            batched,
            run,
            out,
        } => {
            let batch_size = batch_size.or(batched.then_some(config.output.batch_size));
            handle_export(&config, format, batch_size, run, out)
        }
        Command::Stats { run } => handle_stats(&config, run),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_harvest=info,warn"),
            1 => EnvFilter::new("site_harvest=debug,info"),
            2 => EnvFilter::new("site_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_coordinator(config: &Config) -> anyhow::Result<Coordinator> {
    let fetcher = FirecrawlFetcher::from_config(&config.fetcher)
        .context("failed to create page fetcher")?;
    Ok(Coordinator::new(Arc::new(fetcher)))
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    open_storage(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn read_schema(path: &Path) -> anyhow::Result<Schema> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse schema {}", path.display()))
}

/// Rebuilds the latest mapping session from the database
fn load_latest_session(storage: &SqliteStorage) -> anyhow::Result<(i64, MappingSession)> {
    let Some(session) = storage.get_latest_session()? else {
        bail!("no mapping session found; run `site-harvest map <URL>` first");
    };
    let urls = storage.load_session_urls(session.id)?;
    let expanded = storage.load_expanded_paths(session.id)?;
    Ok((
        session.id,
        MappingSession::from_urls(&session.root_url, &urls).with_expanded(expanded),
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handles `map`: discovery, a new session, and the tree
async fn handle_map(
    config: &Config,
    config_hash: &str,
    url: &str,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;
    let mut storage = open_database(config)?;

    let limit = limit.unwrap_or(config.crawl.map_limit);
    let session = MappingSession::discover(coordinator.fetcher().as_ref(), url, limit).await?;

    let session_id = storage.create_session(url, config_hash)?;
    let stored = storage.add_discovered_urls(session_id, &session.urls())?;
    tracing::info!("Session {} stores {} URLs", session_id, stored);

    print!("{}", session.tree().render(None));
    Ok(())
}

/// Handles `expand`: incremental mapping of one node
async fn handle_expand(config: &Config, node_path: &str, limit: Option<u32>) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;
    let mut storage = open_database(config)?;
    let (session_id, mut session) = load_latest_session(&storage)?;

    let limit = limit.unwrap_or(config.crawl.map_limit);
    let outcome = session
        .map_node(coordinator.fetcher().as_ref(), node_path, limit)
        .await;

    storage.add_discovered_urls(session_id, &outcome.added)?;
    let expanded: Vec<String> = session.expanded().iter().cloned().collect();
    storage.add_expanded_paths(session_id, &expanded)?;
    println!(
        "{}: {} URLs in scope, {} new",
        node_path,
        outcome.discovered.len(),
        outcome.added.len()
    );
    print!("{}", session.render());
    Ok(())
}

/// Handles `tree`
fn handle_tree(config: &Config) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let (_, session) = load_latest_session(&storage)?;

    println!("Session root: {}", session.root_url());
    print!("{}", session.render());
    println!("Total URLs: {}", session.tree().total_count());
    Ok(())
}

/// Handles `infer`
async fn handle_infer_command(config: &Config, url: String) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;
    let defaults = CrawlOptions::from_config(&config.crawl);

    match handle_infer(&coordinator, InferQuery { url: Some(url) }, &defaults).await {
        Ok(response) => print_json(&response),
        Err(api_error) => {
            print_json(&api_error.body)?;
            bail!("schema inference failed with status {}", api_error.status)
        }
    }
}

/// Handles `crawl`: selection, the crawl itself, and run persistence
async fn handle_crawl(
    config: &Config,
    mut request: CrawlRequest,
    select: &[String],
) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;
    let mut storage = open_database(config)?;
    let (session_id, mut session) = load_latest_session(&storage)?;

    if select.is_empty() {
        session.select_all();
    } else {
        for path in select {
            match session.toggle(path) {
                Some(state) => tracing::debug!("Toggled {} -> {:?}", path, state),
                None => bail!("no node {} in the current session", path),
            }
        }
    }
    request.url = Some(session.root_url().to_string());
    request.selected_urls = session.selected_urls();

    // Ctrl-C aborts the in-flight crawl
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling crawl");
            signal_token.cancel();
        }
    });

    let run_id = storage.create_run(Some(session_id))?;
    let defaults = CrawlOptions::from_config(&config.crawl);

    match run_crawl(&coordinator, request, &defaults, &cancel).await {
        Ok((response, result)) => {
            storage.complete_run(run_id, &result)?;
            tracing::info!("Run {} completed", run_id);
            print_json(&response)
        }
        Err(api_error) => {
            storage.fail_run(run_id, &api_error.body.error)?;
            print_json(&api_error.body)?;
            bail!("crawl run {} failed with status {}", run_id, api_error.status)
        }
    }
}

/// Handles `export`
fn handle_export(
    config: &Config,
    format: ExportFormat,
    batch_size: Option<usize>,
    run: Option<i64>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let storage = open_database(config)?;

    let run_id = match run {
        Some(id) => storage.get_run(id)?.id,
        None => match storage.get_latest_completed_run()? {
            Some(run) => run.id,
            None => bail!("no completed crawl run to export"),
        },
    };

    let records = storage.load_records(run_id)?;
    let dir = out.unwrap_or_else(|| PathBuf::from(&config.output.export_dir));
    let path = Exporter::new().write_export(&dir, &records, format, batch_size)?;

    println!(
        "Exported {} records from run {} to {}",
        records.len(),
        run_id,
        path.display()
    );
    Ok(())
}

/// Handles `stats`
fn handle_stats(config: &Config, run: Option<i64>) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    println!("Database: {}\n", config.output.database_path);

    let run_id = match run {
        Some(id) => id,
        None => match storage.get_latest_run()? {
            Some(run) => run.id,
            None => bail!("no crawl runs found in database"),
        },
    };

    let stats = load_statistics(&storage, run_id)?;
    print_statistics(&stats);
    Ok(())
}
