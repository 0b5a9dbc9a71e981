//! Exclusion filter for discovered links
//!
//! Rejects URLs that are unlikely to hold crawlable article content. The
//! predicate is pure: it only looks at the URL itself.

use crate::url::matcher::matches_any;
use url::Url;

/// File extensions that never hold article content
const EXCLUDED_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tif", "tiff", "avif",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "csv",
    // archives and binaries
    "zip", "rar", "tar", "gz", "tgz", "7z", "exe", "dmg", "msi", "apk",
    // media
    "mp3", "mp4", "wav", "ogg", "avi", "mov", "wmv", "flv", "webm", "m4a",
    // assets
    "css", "js", "json", "xml", "woff", "woff2", "ttf", "eot", "map",
];

/// Path segments for commerce, account, admin and search flows
const COMMERCE_ACCOUNT_SEGMENTS: &[&str] = &[
    "shop", "store", "cart", "checkout", "basket", "wishlist", "orders", "billing",
    "account", "accounts", "my-account", "profile", "settings", "dashboard",
    "login", "log-in", "signin", "sign-in", "signup", "sign-up", "register", "logout",
    "password", "reset-password", "subscribe", "unsubscribe",
    "admin", "wp-admin", "wp-login.php", "search",
];

/// Path segments for comment, discussion and support flows
const DISCUSSION_SEGMENTS: &[&str] = &[
    "comment", "comments", "discussion", "discussions", "forum", "forums",
    "thread", "threads", "reply", "replies", "community",
    "support", "help-center", "helpdesk", "ticket", "tickets", "feedback",
];

/// Path segments for API, feed and metadata endpoints
const API_FEED_SEGMENTS: &[&str] = &[
    "api", "graphql", "feed", "feeds", "rss", "atom", "wp-json", "xmlrpc.php",
    "oembed", "sitemap.xml", "robots.txt", ".well-known", "wp-content", "wp-includes",
];

/// Social-media and embed-hostile hosts
const SOCIAL_HOSTS: &[&str] = &[
    "*.facebook.com", "*.fb.com", "*.twitter.com", "*.x.com", "t.co",
    "*.instagram.com", "*.linkedin.com", "lnkd.in", "*.reddit.com", "redd.it",
    "*.youtube.com", "youtu.be", "*.tiktok.com", "*.pinterest.com", "*.vimeo.com",
    "*.threads.net", "*.tumblr.com", "*.discord.com", "discord.gg", "*.disqus.com",
    "wa.me", "*.whatsapp.com", "*.snapchat.com",
];

/// Hosts that serve bot challenges or checkpoints
const CHALLENGE_HOSTS: &[&str] = &[
    "challenges.cloudflare.com",
    "*.hcaptcha.com",
    "*.recaptcha.net",
    "*.captcha-delivery.com",
    "*.perimeterx.net",
];

/// Path fragments that indicate a bot checkpoint
const CHALLENGE_PATH_MARKERS: &[&str] = &[
    "/cdn-cgi/",
    "/checkpoint",
    "/captcha",
    "/__challenge",
    "/challenge-platform",
];

/// Query parameters signalling pagination, sorting, filtering or search
const EXCLUDED_QUERY_PARAMS: &[&str] = &[
    "page", "paged", "offset", "limit", "per_page", "start",
    "sort", "sortby", "sort_by", "order", "orderby", "order_by",
    "filter", "filters", "view",
    "q", "query", "search", "s",
    "replytocom", "share",
];

/// Why a URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    FileExtension,
    CommerceOrAccount,
    Discussion,
    SocialHost,
    BotChallenge,
    ApiOrFeed,
    QueryParameter,
}

/// Returns true if the URL should never be enqueued
///
/// # Examples
///
/// ```
/// use url::Url;
/// use kb_crawler::url::should_exclude;
///
/// assert!(should_exclude(&Url::parse("https://example.com/shop/cart").unwrap()));
/// assert!(!should_exclude(&Url::parse("https://example.com/guides/setup").unwrap()));
/// ```
pub fn should_exclude(url: &Url) -> bool {
    exclusion_reason(url).is_some()
}

/// Classifies why a URL is excluded, or `None` if it is crawlable
pub fn exclusion_reason(url: &Url) -> Option<ExclusionReason> {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let path = url.path().to_lowercase();

    if matches_any(SOCIAL_HOSTS, &host) {
        return Some(ExclusionReason::SocialHost);
    }

    if host.contains("captcha")
        || matches_any(CHALLENGE_HOSTS, &host)
        || CHALLENGE_PATH_MARKERS.iter().any(|m| path.contains(m))
    {
        return Some(ExclusionReason::BotChallenge);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if let Some(last) = segments.last() {
        if let Some((_, ext)) = last.rsplit_once('.') {
            if EXCLUDED_EXTENSIONS.contains(&ext) {
                return Some(ExclusionReason::FileExtension);
            }
        }
    }

    for segment in &segments {
        if API_FEED_SEGMENTS.contains(segment) {
            return Some(ExclusionReason::ApiOrFeed);
        }
        if COMMERCE_ACCOUNT_SEGMENTS.contains(segment) {
            return Some(ExclusionReason::CommerceOrAccount);
        }
        if DISCUSSION_SEGMENTS.contains(segment) {
            return Some(ExclusionReason::Discussion);
        }
    }

    if url
        .query_pairs()
        .any(|(key, _)| EXCLUDED_QUERY_PARAMS.contains(&key.to_lowercase().as_str()))
    {
        return Some(ExclusionReason::QueryParameter);
    }

    None
}
