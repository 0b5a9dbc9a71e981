use crate::UrlError;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use kb_crawler::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// The set of hosts a crawl run is allowed to visit
///
/// A URL is in scope when its host equals the seed host, or equals `www.`
/// followed by the seed host. The tolerance is one-way: a seed of
/// `www.example.com` does not admit `example.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    seed_host: String,
    www_host: String,
}

impl Scope {
    /// Builds the scope from the seed URL's host
    pub fn from_seed(seed: &Url) -> Result<Self, UrlError> {
        let seed_host = extract_domain(seed).ok_or(UrlError::MissingHost)?;
        let www_host = format!("www.{}", seed_host);
        Ok(Self {
            seed_host,
            www_host,
        })
    }

    /// The seed host this scope was built from
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    /// Returns true if `url` belongs to the crawled site
    pub fn contains(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) => host == self.seed_host || host == self.www_host,
            None => false,
        }
    }
}
