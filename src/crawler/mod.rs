//! Crawler module for fetching, rendering and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `HttpFetch` seam
//! - Script rendering behind the `Renderer` seam
//! - Request pacing, backoff and identity rotation
//! - The crawl engine and the handle used to observe or cancel a run

mod engine;
mod fetcher;
mod rate_limiter;
mod renderer;
mod run;

pub use engine::{CrawlEngine, PageError, SCRIPT_HEAVY_HOSTS};
pub use fetcher::{
    browser_headers, build_http_client, FetchError, FetchResponse, HttpFetch, ReqwestFetcher,
};
pub use rate_limiter::RateLimiter;
pub use renderer::{RemoteRenderer, RemoteRendererLauncher, RenderError, Renderer, RendererLauncher};
pub use run::{CrawlOutcome, LogLine, ProgressSnapshot, RunHandle, RunProgress};

use crate::config::Config;
use crate::CrawlError;
use std::sync::Arc;

/// Starts a crawl of `seed` on the tokio runtime
///
/// This is the main entry point for running a crawl. The seed is validated
/// before anything is spawned; the returned handle reports progress, accepts
/// cancellation and yields the final outcome.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - Absolute `http(s)` URL to start from
/// * `fetcher` - Static HTTP collaborator
/// * `launcher` - Rendering collaborator; `None` disables the rendered path
///
/// # Returns
///
/// * `Ok(RunHandle)` - The run is executing
/// * `Err(CrawlError)` - The seed was rejected
pub fn start_crawl(
    config: &Config,
    seed: &str,
    fetcher: Arc<dyn HttpFetch>,
    launcher: Option<Arc<dyn RendererLauncher>>,
) -> Result<RunHandle, CrawlError> {
    Ok(CrawlEngine::new(config, seed, fetcher, launcher)?.spawn())
}
