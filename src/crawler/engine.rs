//! Crawl engine - the traversal loop and per-URL strategy
//!
//! This module contains the main crawl loop that coordinates one run:
//! - Draining the FIFO frontier until the budget is met or it runs dry
//! - Choosing static or rendered extraction per URL, with fallback
//! - Rate limiting, 429 backoff and 403 identity rotation
//! - Feeding discovered links back into the frontier
//! - Cooperative cancellation and renderer cleanup

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::{browser_headers, FetchResponse, HttpFetch};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::renderer::{RenderError, Renderer, RendererLauncher};
use crate::crawler::run::{CrawlOutcome, LogLine, RunHandle, RunProgress};
use crate::extract::{
    extract_links, filter_links, is_listing_root, is_throttle_page, needs_rendering, ContentRecord,
    PageExtractor, RenderedPage,
};
use crate::output::CrawlReport;
use crate::state::{CrawlState, RunStatus};
use crate::url::{matches_any, normalize_url, Scope};
use crate::CrawlError;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

/// Hosting platforms whose pages are assembled client-side
pub const SCRIPT_HEAVY_HOSTS: &[&str] = &[
    "*.webflow.io",
    "*.framer.app",
    "*.framer.website",
    "*.wixsite.com",
    "*.squarespace.com",
    "*.vercel.app",
    "*.netlify.app",
    "*.notion.site",
];

/// Selector awaited after navigation before the page is read
const READY_SELECTOR: &str = "body";

/// Why a single URL could not be processed
///
/// None of these end the run; the URL is abandoned or the other extraction
/// path is tried.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Transient fetch failure: {0}")]
    TransientFetch(String),

    #[error("Still rate limited after {0} attempts")]
    RateLimited(u32),

    #[error("Blocked (HTTP 403)")]
    Blocked,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Timed out waiting for the rendered page: {0}")]
    RenderTimeout(String),

    #[error("Rendering failed: {0}")]
    RenderFailure(String),

    #[error("Rendering session unavailable: {0}")]
    SetupFailure(String),
}

impl From<RenderError> for PageError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Timeout(selector) => PageError::RenderTimeout(selector),
            RenderError::Setup(msg) => PageError::SetupFailure(msg),
            other => PageError::RenderFailure(other.to_string()),
        }
    }
}

/// Records and links produced for one URL
#[derive(Debug, Default)]
struct PageOutcome {
    records: Vec<ContentRecord>,
    links: Vec<Url>,
}

/// Result of a static fetch that got a response
enum StaticOutcome {
    /// Parsed normally; records may be empty
    Extracted(PageOutcome),

    /// The page needs a script runtime; carries the links found statically
    NeedsRendering(Vec<Url>),

    /// HTTP 403
    Blocked,
}

/// Drives one crawl run from seed to terminal status
pub struct CrawlEngine {
    settings: CrawlerConfig,
    script_heavy_hosts: Vec<String>,
    renderer_required: bool,
    fetcher: Arc<dyn HttpFetch>,
    launcher: Option<Arc<dyn RendererLauncher>>,
    renderer: Option<Box<dyn Renderer>>,
    renderer_unavailable: bool,
    limiter: RateLimiter,
    extractor: PageExtractor,
    scope: Scope,
    seed: Url,
    state: CrawlState,
    status: RunStatus,
    progress: Arc<RunProgress>,
    log_tx: Option<UnboundedSender<LogLine>>,
}

impl CrawlEngine {
    /// Creates an idle engine for `seed`
    ///
    /// The seed must be an absolute `http(s)` URL; it is normalized and its
    /// host defines the crawl scope.
    pub fn new(
        config: &Config,
        seed: &str,
        fetcher: Arc<dyn HttpFetch>,
        launcher: Option<Arc<dyn RendererLauncher>>,
    ) -> Result<Self, CrawlError> {
        let seed = normalize_url(seed)?;
        let scope = Scope::from_seed(&seed)?;
        let state = CrawlState::new(seed.clone(), config.crawler.max_pages);

        let script_heavy_hosts = SCRIPT_HEAVY_HOSTS
            .iter()
            .map(|s| s.to_string())
            .chain(config.renderer.script_heavy_hosts.iter().cloned())
            .collect();

        Ok(Self {
            settings: config.crawler.clone(),
            script_heavy_hosts,
            renderer_required: config.renderer.required,
            fetcher,
            launcher,
            renderer: None,
            renderer_unavailable: false,
            limiter: RateLimiter::new(config.crawler.base_delay(), config.user_agent.pool.clone()),
            extractor: PageExtractor::new((&config.listing).into()),
            scope,
            seed,
            state,
            status: RunStatus::Idle,
            progress: Arc::new(RunProgress::default()),
            log_tx: None,
        })
    }

    /// Sends progress messages to `tx` as timestamped lines
    pub fn with_log_channel(mut self, tx: UnboundedSender<LogLine>) -> Self {
        self.log_tx = Some(tx);
        self
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    /// Spawns the run on the tokio runtime
    ///
    /// The run reports as running from the moment this returns, before the
    /// task is first polled.
    pub fn spawn(self) -> RunHandle {
        let progress = self.progress();
        progress.set_running(true);
        let task = tokio::spawn(self.run());
        RunHandle::new(progress, task)
    }

    /// Runs the crawl to a terminal status
    ///
    /// The rendering session, if one was started, is closed on every exit
    /// path.
    pub async fn run(mut self) -> CrawlOutcome {
        self.progress.set_running(true);
        self.log(format!("Starting crawl of {}", self.seed));

        let terminal = match self.start().await {
            Ok(()) => {
                self.transition(RunStatus::Running);
                self.crawl_loop().await
            }
            Err(e) => {
                tracing::error!("Run failed to start: {}", e);
                self.log(format!("Run failed: {}", e));
                RunStatus::Failed
            }
        };
        self.transition(terminal);

        self.close_renderer().await;
        self.progress
            .record_counts(self.state.visited_count(), self.state.result_count());
        self.progress.set_running(false);
        self.log(format!(
            "Crawl {}: {} records from {} pages",
            self.status,
            self.state.result_count(),
            self.state.visited_count()
        ));

        let status = self.status;
        let site = self.seed.to_string();
        let (items, visited) = self.state.into_parts();

        CrawlOutcome {
            status,
            report: CrawlReport::new(site, items),
            visited,
        }
    }

    /// Starts the rendering session up front when it is mandatory
    async fn start(&mut self) -> Result<(), CrawlError> {
        if !self.renderer_required {
            return Ok(());
        }

        self.ensure_renderer()
            .await
            .map_err(|e| CrawlError::RendererSetup(e.to_string()))
    }

    async fn crawl_loop(&mut self) -> RunStatus {
        loop {
            if self.progress.is_cancelled() {
                self.log("Cancellation requested, stopping".to_string());
                return RunStatus::Cancelled;
            }

            if self.state.budget_reached() {
                self.log(format!(
                    "Page budget of {} reached",
                    self.settings.max_pages
                ));
                return RunStatus::Completed;
            }

            let Some(url) = self.state.pop_front() else {
                self.log("Frontier exhausted".to_string());
                return RunStatus::Completed;
            };

            if !self.state.mark_visited(&url) {
                tracing::debug!("Skipping already visited {}", url);
                continue;
            }
            self.progress
                .record_counts(self.state.visited_count(), self.state.result_count());
            self.log(format!("Visiting {}", url));

            let page = self.process_url(&url).await;

            let found = page.records.len();
            let kept = self.state.push_records(page.records);
            let mut queued = 0;
            for link in page.links {
                if self.state.enqueue(link) {
                    queued += 1;
                }
            }

            self.progress
                .record_counts(self.state.visited_count(), self.state.result_count());
            if found > 0 || queued > 0 {
                self.log(format!(
                    "{}: kept {} of {} records, queued {} links ({} pending)",
                    url,
                    kept,
                    found,
                    queued,
                    self.state.frontier_len()
                ));
            }
        }
    }

    /// Processes one URL with the static/dynamic strategy and fallback
    async fn process_url(&mut self, url: &Url) -> PageOutcome {
        let mut links = Vec::new();
        let mut dynamic_tried = false;

        if self.prefers_dynamic(url) {
            dynamic_tried = true;
            if let Some(records) = self.dynamic_attempt(url, &mut links).await {
                return PageOutcome { records, links };
            }
        }

        let static_result = match self.static_pass(url).await {
            Ok(StaticOutcome::Blocked) => {
                tracing::warn!("{} answered 403", url);
                if !dynamic_tried {
                    dynamic_tried = true;
                    self.log(format!("Blocked at {}, trying rendered bypass", url));
                    if let Some(records) = self.dynamic_attempt(url, &mut links).await {
                        return PageOutcome { records, links };
                    }
                }
                self.retry_with_rotation(url).await
            }
            other => other,
        };

        match static_result {
            Ok(StaticOutcome::Extracted(page)) => {
                links.extend(page.links);
                let records = self.acceptable(page.records);
                if !records.is_empty() {
                    return PageOutcome { records, links };
                }
                tracing::debug!("No acceptable static records at {}", url);
            }
            Ok(StaticOutcome::NeedsRendering(found)) => {
                links.extend(found);
                self.log(format!("{} needs a script runtime, rendering", url));
            }
            Ok(StaticOutcome::Blocked) => {
                self.abandon(url, &PageError::Blocked);
                return PageOutcome::default();
            }
            Err(e) => {
                self.abandon(url, &e);
                return PageOutcome::default();
            }
        }

        if !dynamic_tried {
            if let Some(records) = self.dynamic_attempt(url, &mut links).await {
                return PageOutcome { records, links };
            }
        }

        PageOutcome {
            records: Vec::new(),
            links,
        }
    }

    fn prefers_dynamic(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default();
        matches_any(&self.script_heavy_hosts, host) || is_listing_root(url)
    }

    /// Keeps records whose content is longer than the configured minimum
    fn acceptable(&self, records: Vec<ContentRecord>) -> Vec<ContentRecord> {
        records
            .into_iter()
            .filter(|r| r.content().chars().count() > self.settings.min_content_length)
            .collect()
    }

    // ===== Static path =====

    async fn static_pass(&mut self, url: &Url) -> Result<StaticOutcome, PageError> {
        let response = self.fetch_with_retry(url).await?;

        if response.status == 403 {
            return Ok(StaticOutcome::Blocked);
        }
        if !response.is_success() {
            return Err(PageError::Http(response.status));
        }

        let links = extract_links(&response.body, url, &self.scope, |u| {
            self.state.is_visited(u)
        });

        if needs_rendering(&response.body) {
            return Ok(StaticOutcome::NeedsRendering(links));
        }

        let records = self.extractor.extract_from_static_html(&response.body, url);
        Ok(StaticOutcome::Extracted(PageOutcome { records, links }))
    }

    /// Fetches with rate-limit handling
    ///
    /// A 429, or a success response that is really a throttle page, is
    /// followed by an exponential backoff; after `max_attempts` such
    /// responses the URL is given up.
    async fn fetch_with_retry(&mut self, url: &Url) -> Result<FetchResponse, PageError> {
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 0..attempts {
            self.limiter.wait_if_needed().await;

            let headers = browser_headers(self.limiter.current_identity());
            let response = self
                .fetcher
                .get(url.as_str(), &headers, self.settings.fetch_timeout())
                .await
                .map_err(|e| PageError::TransientFetch(e.to_string()))?;

            let throttled = response.status == 429
                || (response.is_success() && is_throttle_page(&response.body));
            if !throttled {
                return Ok(response);
            }

            let waited = self.limiter.backoff(attempt).await;
            tracing::warn!(
                "Rate limited at {} (attempt {}/{}), backed off {:?}",
                url,
                attempt + 1,
                attempts,
                waited
            );
        }

        Err(PageError::RateLimited(attempts))
    }

    /// Retries a 403'd URL under fresh identities
    async fn retry_with_rotation(&mut self, url: &Url) -> Result<StaticOutcome, PageError> {
        for rotation in 1..=self.settings.max_identity_rotations {
            let Some(identity) = self.limiter.rotate_identity().map(str::to_string) else {
                break;
            };
            self.log(format!(
                "Retrying {} with another identity ({}/{})",
                url, rotation, self.settings.max_identity_rotations
            ));
            tracing::debug!("Identity is now {}", identity);

            match self.static_pass(url).await? {
                StaticOutcome::Blocked => continue,
                other => return Ok(other),
            }
        }

        Err(PageError::Blocked)
    }

    // ===== Dynamic path =====

    /// Runs the rendered path, appending its links
    ///
    /// Returns the acceptable records, or `None` if there were none or the
    /// attempt failed.
    async fn dynamic_attempt(
        &mut self,
        url: &Url,
        links: &mut Vec<Url>,
    ) -> Option<Vec<ContentRecord>> {
        if self.launcher.is_none() {
            tracing::debug!("No renderer configured, skipping rendered pass for {}", url);
            return None;
        }

        match self.dynamic_pass(url).await {
            Ok(page) => {
                links.extend(page.links);
                let records = self.acceptable(page.records);
                if records.is_empty() {
                    tracing::debug!("No acceptable rendered records at {}", url);
                    None
                } else {
                    Some(records)
                }
            }
            Err(e) => {
                tracing::warn!("Rendered pass failed for {}: {}", url, e);
                self.log(format!("Rendering {} failed: {}", url, e));
                None
            }
        }
    }

    async fn dynamic_pass(&mut self, url: &Url) -> Result<PageOutcome, PageError> {
        self.ensure_renderer().await?;
        self.limiter.wait_if_needed().await;

        let timeout = self.settings.render_timeout();
        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| PageError::SetupFailure("no rendering session".to_string()))?;

        renderer.navigate(url.as_str()).await?;
        renderer.wait_for_selector(READY_SELECTOR, timeout).await?;

        let page = RenderedPage {
            title: renderer.title().await?,
            text: renderer.rendered_text().await?,
            html: renderer.rendered_html().await?,
        };
        let hrefs = renderer.find_links().await?;

        let records = self.extractor.extract_from_rendered_page(&page, url);
        let links = filter_links(hrefs, url, &self.scope, |u| self.state.is_visited(u));

        Ok(PageOutcome { records, links })
    }

    /// Starts the rendering session on first use
    ///
    /// A failed launch is remembered so later URLs do not retry it.
    async fn ensure_renderer(&mut self) -> Result<(), PageError> {
        if self.renderer.is_some() {
            return Ok(());
        }
        if self.renderer_unavailable {
            return Err(PageError::SetupFailure(
                "rendering session failed to start earlier".to_string(),
            ));
        }

        let Some(launcher) = self.launcher.clone() else {
            self.renderer_unavailable = true;
            return Err(PageError::SetupFailure("no renderer configured".to_string()));
        };

        match launcher.launch().await {
            Ok(renderer) => {
                self.log("Rendering session started".to_string());
                self.renderer = Some(renderer);
                Ok(())
            }
            Err(e) => {
                self.renderer_unavailable = true;
                tracing::warn!("Could not start rendering session: {}", e);
                Err(PageError::from(e))
            }
        }
    }

    async fn close_renderer(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            match renderer.close().await {
                Ok(()) => tracing::debug!("Rendering session closed"),
                Err(e) => tracing::warn!("Failed to close rendering session: {}", e),
            }
        }
    }

    // ===== Bookkeeping =====

    fn transition(&mut self, next: RunStatus) {
        match self.status.transition(next) {
            Ok(status) => self.status = status,
            Err(e) => tracing::error!("{}", e),
        }
    }

    fn abandon(&self, url: &Url, error: &PageError) {
        tracing::warn!("Abandoning {}: {}", url, error);
        self.log(format!("Skipped {}: {}", url, error));
    }

    /// Reports a step of the run
    ///
    /// With a log channel attached the line goes to the channel and only to
    /// `tracing` at debug level, so a watcher printing the channel does not
    /// see every step twice.
    fn log(&self, message: String) {
        match &self.log_tx {
            Some(tx) => {
                tracing::debug!("{}", message);
                // A dropped receiver only means nobody is watching
                let _ = tx.send(LogLine::now(message));
            }
            None => tracing::info!("{}", message),
        }
    }
}
