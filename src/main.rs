//! Gleaner command-line interface
//!
//! Loads a TOML crawl plan, runs the engine, and streams one JSON record
//! per terminal page.

use anyhow::Context;
use clap::Parser;
use gleaner::config::{load_plan_with_hash, Plan, RuleEntry};
use gleaner::Engine;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Gleaner: a rule-driven web crawler
///
/// Gleaner fetches pages starting from the plan's seeds, applies the
/// plan's extraction rules, follows discovered links, and writes one JSON
/// record per terminal page.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "A rule-driven web crawler", long_about = None)]
struct Cli {
    /// Path to TOML crawl plan
    #[arg(value_name = "PLAN")]
    plan: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the plan and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Write records to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading crawl plan from: {}", cli.plan.display());
    let (plan, hash) = load_plan_with_hash(&cli.plan)
        .with_context(|| format!("failed to load plan {}", cli.plan.display()))?;
    tracing::info!("Plan loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&plan);
        return Ok(());
    }

    handle_crawl(&plan, cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates the plan and shows what would be
/// crawled
fn handle_dry_run(plan: &Plan) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Engine:");
    println!("  Parallelism: {}", plan.engine.parallelism);
    println!("  Idle timeout: {}ms", plan.engine.idle_timeout_ms);
    if let Some(base) = &plan.engine.base_location {
        println!("  Base location: {}", base);
    }
    if let Some(dir) = &plan.engine.resource_dir {
        println!("  Resource dir: {}", dir);
    }

    println!("\nSeeds ({}):", plan.seeds.len());
    for seed in &plan.seeds {
        println!(
            "  - {} ({} rules, {} total)",
            seed.location,
            seed.rules.len(),
            rule_count(&seed.rules)
        );
    }

    println!("\n✓ Plan is valid");
}

/// Counts rules including those nested under source rules
fn rule_count(rules: &[RuleEntry]) -> usize {
    rules
        .iter()
        .map(|rule| 1 + rule.rules.as_deref().map_or(0, rule_count))
        .sum()
}

/// Handles the main crawl operation
async fn handle_crawl(plan: &Plan, output: Option<PathBuf>) -> anyhow::Result<()> {
    let writer: Box<dyn Write + Send> = match &output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let writer = Arc::new(Mutex::new(writer));
    let records = Arc::new(AtomicUsize::new(0));

    let seeds = plan.seed_items();
    tracing::info!("Starting crawl with {} seeds", seeds.len());
    let start = std::time::Instant::now();

    let sink_writer = Arc::clone(&writer);
    let sink_records = Arc::clone(&records);
    let engine = Engine::new(plan.options())
        .context("failed to build engine")?
        .on_record(move |record| {
            sink_records.fetch_add(1, Ordering::Relaxed);
            match serde_json::to_string(&record) {
                Ok(line) => {
                    let mut writer = sink_writer.lock().unwrap();
                    if let Err(e) = writeln!(writer, "{}", line) {
                        tracing::error!("failed to write record: {}", e);
                    }
                }
                Err(e) => tracing::error!("failed to serialize record: {}", e),
            }
        })
        .on_log(|message| tracing::info!("{}", message));

    engine.run(seeds).await;

    writer
        .lock()
        .unwrap()
        .flush()
        .context("failed to flush record output")?;

    tracing::info!(
        "Crawl completed: {} records in {:?}",
        records.load(Ordering::Relaxed),
        start.elapsed()
    );

    Ok(())
}
