//! The crawl engine: worker pool, planned-step execution, record flushing.

use crate::engine::downloader::{download_resource, DownloadOutcome};
use crate::engine::evaluator::{evaluate, Evaluation, Step};
use crate::engine::fetcher::{build_http_client, fetch_document};
use crate::engine::frontier::Frontier;
use crate::rules::{EngineOptions, WorkItem};
use crate::GleanError;
use reqwest::Client;
use scraper::Html;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked once per terminal work item with its accumulated
/// content. Called concurrently from multiple workers; it must synchronize
/// internally.
pub type RecordSink = Arc<dyn Fn(HashMap<String, String>) + Send + Sync>;

/// Optional diagnostics callback. Also called concurrently; when absent,
/// failures are visible only through `tracing`.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// The crawl engine: a fixed pool of workers draining one shared frontier.
///
/// Seeds go in through [`Engine::run`]; each worker loops dequeue → fetch
/// → evaluate → apply until it waits a full idle timeout with nothing
/// arriving. Discovery rules grow the frontier mid-run; terminal items are
/// flushed to the record sink.
pub struct Engine {
    options: EngineOptions,
    client: Client,
    sink: Option<RecordSink>,
    log: Option<LogSink>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Self, GleanError> {
        Ok(Self {
            options,
            client: build_http_client()?,
            sink: None,
            log: None,
        })
    }

    /// Installs the record sink invoked once per terminal item.
    pub fn on_record(
        mut self,
        sink: impl Fn(HashMap<String, String>) + Send + Sync + 'static,
    ) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Installs the diagnostics callback.
    pub fn on_log(mut self, log: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log = Some(Arc::new(log));
        self
    }

    /// Runs the crawl: enqueues all seeds, starts `parallelism` workers,
    /// and returns once every worker has exited via idle timeout.
    ///
    /// Workers self-terminate independently: each gives up only after a
    /// full `idle_timeout` with nothing arriving. An idle timeout smaller
    /// than per-page fetch latency can therefore shut the pool down while
    /// a slow fetch is about to enqueue children — those items are lost.
    /// There is no way to abort a run early.
    pub async fn run(&self, seeds: Vec<WorkItem>) {
        let ctx = Arc::new(WorkerContext {
            options: self.options.clone(),
            frontier: Frontier::new(),
            client: self.client.clone(),
            sink: self.sink.clone(),
            log: self.log.clone(),
        });

        for seed in seeds {
            ctx.frontier.enqueue(seed);
        }

        let workers: Vec<_> = (0..self.options.parallelism.max(1))
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&ctx))))
            .collect();

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("worker task failed: {}", e);
            }
        }
    }
}

/// Shared state injected into every worker.
struct WorkerContext {
    options: EngineOptions,
    frontier: Frontier,
    client: Client,
    sink: Option<RecordSink>,
    log: Option<LogSink>,
}

impl WorkerContext {
    fn log(&self, message: &str) {
        if let Some(log) = &self.log {
            log(message);
        }
    }
}

async fn worker_loop(id: usize, ctx: Arc<WorkerContext>) {
    tracing::debug!(worker = id, "worker started");

    while let Some(mut item) = ctx.frontier.dequeue(ctx.options.idle_timeout).await {
        process_item(&ctx, &mut item).await;
    }

    tracing::debug!(worker = id, "worker idle timeout, exiting");
}

/// Processes one work item start to finish. Failures are logged and end
/// this item only; they never propagate out of the worker.
async fn process_item(ctx: &WorkerContext, item: &mut WorkItem) {
    normalize_location(&mut item.location, ctx.options.base_location.as_deref());
    tracing::debug!("processing {}", item.location);

    let body = match fetch_document(&ctx.client, &item.location).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("fetch failed for {}: {}", item.location, e);
            ctx.log(&format!("[fetch error]: {}", e));
            return;
        }
    };
    if body.is_empty() {
        return;
    }

    // Html is not Send: all selector work happens here, synchronously,
    // and only the owned plan crosses await points.
    let evaluation = {
        let document = Html::parse_document(&body);
        evaluate(&document, &item.rules)
    };

    apply(ctx, item, evaluation).await;
}

/// Replays the planned steps in rule order: field writes, image
/// downloads, child enqueues; then flushes terminal items.
async fn apply(ctx: &WorkerContext, item: &mut WorkItem, evaluation: Evaluation) {
    for step in evaluation.steps {
        match step {
            Step::Field { name, value } => {
                item.content.insert(name, value);
            }

            Step::Images { name, sources } => {
                let mut files = Vec::new();
                for source in sources {
                    let outcome = download_resource(
                        &ctx.client,
                        &source,
                        ctx.options.resource_dir.as_deref(),
                    )
                    .await;
                    match outcome {
                        DownloadOutcome::Saved(file) => files.push(file),
                        DownloadOutcome::Skipped => {}
                        DownloadOutcome::Failed(message) => {
                            tracing::warn!("{}", message);
                            ctx.log(&format!("[image error]: {}", message));
                        }
                    }
                }
                if !files.is_empty() {
                    item.content.insert(name, files.join("; "));
                }
            }

            Step::Discover(discoveries) => {
                for discovery in discoveries {
                    tracing::debug!("discovered {} from {}", discovery.location, item.location);
                    ctx.log(&format!("[source]: {}", discovery.location));
                    ctx.frontier
                        .enqueue(WorkItem::child(discovery.location, discovery.rules, item));
                }
            }
        }
    }

    if evaluation.terminal {
        if let Some(sink) = &ctx.sink {
            sink(std::mem::take(&mut item.content));
        }
        ctx.log(&format!("[record]: {}", item.location));
        tracing::info!("record flushed for {}", item.location);
    }
}

/// Rewrites `location` to the form used for the fetch: a protocol-relative
/// location gains the `http:` scheme, and a configured base is prepended
/// when the location does not already start with it. Runs exactly once per
/// item, immediately before its fetch.
fn normalize_location(location: &mut String, base: Option<&str>) {
    if location.starts_with("//") {
        location.insert_str(0, "http:");
    }

    if let Some(base) = base {
        if !location.starts_with(base) {
            location.insert_str(0, base);
        }
    }
}
