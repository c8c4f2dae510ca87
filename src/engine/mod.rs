//! The concurrent crawl engine
//!
//! This module contains the core crawling machinery:
//! - The frontier queue shared by all workers
//! - The worker pool and per-item processing
//! - Rule evaluation against parsed documents
//! - Document fetching and resource downloads

mod downloader;
mod evaluator;
mod fetcher;
mod frontier;
mod worker;

pub use downloader::{download_resource, DownloadOutcome};
pub use evaluator::{evaluate, Discovery, Evaluation, Step};
pub use fetcher::{build_http_client, fetch_document};
pub use frontier::Frontier;
pub use worker::{Engine, LogSink, RecordSink};
