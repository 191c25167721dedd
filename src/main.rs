//! SiteGleaner main entry point
//!
//! This is the command-line interface for the SiteGleaner crawler.

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use sitegleaner::answer::{answer_question, ChatCompletionsClient};
use sitegleaner::api::{create_router, AppState};
use sitegleaner::config::{load_config, Config};
use sitegleaner::crawler::{Crawler, PageResult};
use sitegleaner::store::MemoryStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SiteGleaner: a bounded same-site crawler
///
/// SiteGleaner crawls a site from one or more seed URLs, bounded by link depth
/// and a page budget, and summarizes every page it reaches. It can answer a
/// question from the crawled pages or serve the same over HTTP.
#[derive(Parser, Debug)]
#[command(name = "sitegleaner")]
#[command(version)]
#[command(about = "A bounded same-site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to crawl (repeatable; added to the seeds in the config)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the maximum link depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override the page budget per seed
    #[arg(long)]
    max_pages: Option<usize>,

    /// Ask a question about the crawled pages
    #[arg(long)]
    question: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Serve the HTTP API on this address instead of crawling
    #[arg(long, value_name = "ADDR", conflicts_with_all = ["dry_run", "question"])]
    serve: Option<SocketAddr>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    config.seeds.extend(cli.seeds.iter().cloned());

    if cli.dry_run {
        handle_dry_run(&config);
    } else if let Some(addr) = cli.serve {
        handle_serve(&config, addr).await?;
    } else {
        handle_crawl(&config, cli.question.as_deref(), cli.json).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sitegleaner=info,warn")),
            1 => EnvFilter::new("sitegleaner=debug,info"),
            2 => EnvFilter::new("sitegleaner=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== SiteGleaner Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages per seed: {}", config.crawler.max_pages);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Static timeout: {}ms", config.crawler.static_timeout_ms);
    println!("  Render timeout: {}ms", config.crawler.render_timeout_ms);
    match config.crawler.crawl_timeout_secs {
        Some(secs) => println!("  Crawl deadline: {}s", secs),
        None => println!("  Crawl deadline: none"),
    }
    println!("  Scope: {:?}", config.crawler.scope);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nRenderer:");
    match &config.renderer {
        Some(renderer) => println!(
            "  WebDriver: {} (headless: {})",
            renderer.webdriver_url, renderer.headless
        ),
        None => println!("  disabled (static fetches only)"),
    }

    println!("\nAnswer Service:");
    println!("  Endpoint: {}", config.answer.api_base);
    println!("  Model: {}", config.answer.model);
    println!("  API key variable: {}", config.answer.api_key_env);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the default mode: crawl every seed and print the results
async fn handle_crawl(config: &Config, question: Option<&str>, as_json: bool) -> anyhow::Result<()> {
    if config.seeds.is_empty() {
        bail!("no seeds to crawl; add `seeds` to the config or pass --seed");
    }

    let crawler = Crawler::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight pages");
            on_interrupt.cancel();
        }
    });

    let results = crawler
        .crawl_many(
            &config.seeds,
            config.crawler.max_depth,
            config.crawler.max_pages,
            cancel,
        )
        .await?;

    let answer = match question {
        Some(question) => {
            let client = ChatCompletionsClient::from_config(&config.answer)?;
            Some(answer_question(&client, question, &results).await?)
        }
        None => None,
    };

    if as_json {
        let output = json!({ "results": results, "answer": answer });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_results(&results);
    if let Some(answer) = answer {
        println!("\n=== Answer ===\n\n{}\n", answer.answer);
        for source in &answer.sources {
            println!("[{}] {} ({})", source.index, source.title, source.url);
        }
    }

    Ok(())
}

fn print_results(results: &[PageResult]) {
    let failed = results.iter().filter(|r| !r.is_success()).count();
    println!(
        "=== Crawled {} pages ({} failed) ===",
        results.len(),
        failed
    );

    for (i, result) in results.iter().enumerate() {
        match result {
            PageResult::Success(page) => {
                println!("\n[{}] {}", i + 1, page.url);
                println!("  Title: {}", page.display_title());
                println!("  H1: {}", page.display_h1());
                println!("  H2: {}", page.display_h2());
                println!("  Summary: {}", page.content_summary);
            }
            PageResult::Failure(failure) => {
                println!("\n[{}] {}", i + 1, failure.url);
                println!("  Error: {}", failure.error);
            }
        }
    }
}

/// Handles the --serve mode: runs the HTTP API until interrupted
async fn handle_serve(config: &Config, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState {
        crawler: Arc::new(Crawler::from_config(config)?),
        answerer: Arc::new(ChatCompletionsClient::from_config(&config.answer)?),
        store: Arc::new(MemoryStore::from_config(&config.store)),
        max_depth: config.crawler.max_depth,
        max_pages: config.crawler.max_pages,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(Arc::new(state)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
