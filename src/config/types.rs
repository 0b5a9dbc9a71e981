use crate::extract::ListingSettings;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for kb-crawler
///
/// Every section and every field has a default, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub renderer: RendererConfig,
    pub listing: ListingConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of content records to collect
    pub max_pages: usize,

    /// Minimum time between consecutive requests (milliseconds)
    pub base_delay_ms: u64,

    /// Per-request timeout for static fetches (seconds)
    pub fetch_timeout_secs: u64,

    /// Bound on waiting for a rendered page to become ready (seconds)
    pub render_timeout_secs: u64,

    /// Fetch attempts per URL while rate limited
    pub max_attempts: u32,

    /// User-agent rotations per hard-blocked URL
    pub max_identity_rotations: u32,

    /// A record's content must be longer than this many characters
    pub min_content_length: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            base_delay_ms: 1000,
            fetch_timeout_secs: 15,
            render_timeout_secs: 12,
            max_attempts: 3,
            max_identity_rotations: 2,
            min_content_length: 50,
        }
    }
}

impl CrawlerConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

/// User-agent identities presented to sites
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Identities in rotation order; the first one is used until a hard block
    pub pool: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            pool: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
            ],
        }
    }
}

/// Rendering service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RendererConfig {
    /// Remote rendering service URL; without it only static fetching is used
    pub endpoint: Option<String>,

    /// Fail the run when the rendering session cannot be started
    pub required: bool,

    /// Extra host patterns (e.g. "*.example.io") to render first
    pub script_heavy_hosts: Vec<String>,
}

/// Blog listing splitter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Post titles to split on instead of detected headings
    pub known_titles: Vec<String>,

    /// Maximum posts taken from one listing page
    pub max_posts: usize,

    /// A post body must be longer than this many characters
    pub min_post_length: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        let settings = ListingSettings::default();
        Self {
            known_titles: settings.known_titles,
            max_posts: settings.max_posts,
            min_post_length: settings.min_post_length,
        }
    }
}

impl From<&ListingConfig> for ListingSettings {
    fn from(config: &ListingConfig) -> Self {
        Self {
            known_titles: config.known_titles.clone(),
            max_posts: config.max_posts,
            min_post_length: config.min_post_length,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the JSON report is written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
