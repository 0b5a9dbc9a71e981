use crate::extract::ContentType;
use crate::url::matches_any;
use url::Url;

const BLOG_PATH_MARKERS: &[&str] = &["/blog", "/post", "/article", "/news"];
const PODCAST_TITLE_WORDS: &[&str] = &["podcast", "episode", "interview"];
const CALL_TITLE_WORDS: &[&str] = &["call", "meeting", "transcript", "recording"];
const BOOK_TITLE_WORDS: &[&str] = &["book", "chapter", "ebook", "guide"];

const PROFESSIONAL_NETWORK_HOSTS: &[&str] = &["*.linkedin.com", "lnkd.in"];
const FORUM_HOSTS: &[&str] = &["*.reddit.com", "redd.it"];

/// Labels content by inferred type
///
/// Rules are checked in a fixed order and the first match wins, so a URL
/// rule outranks a title rule:
///
/// 1. URL path contains `/blog`, `/post`, `/article` or `/news` → `Blog`
/// 2. Title mentions a podcast, episode or interview → `PodcastTranscript`
/// 3. Title mentions a call, meeting, transcript or recording → `CallTranscript`
/// 4. Professional-network host → `LinkedinPost`
/// 5. Discussion-forum host → `RedditComment`
/// 6. Title mentions a book, chapter, ebook or guide → `Book`
/// 7. Otherwise `Other`
///
/// All comparisons are case-insensitive substring matches. The content is
/// accepted for signature stability but no rule reads it.
///
/// # Examples
///
/// ```
/// use kb_crawler::{classify, ContentType};
///
/// let kind = classify("Podcast Episode 5", "", "https://example.com/blog/x");
/// assert_eq!(kind, ContentType::Blog);
/// ```
pub fn classify(title: &str, _content: &str, url: &str) -> ContentType {
    let title = title.to_lowercase();
    let (host, path) = match Url::parse(url) {
        Ok(parsed) => (
            parsed.host_str().unwrap_or_default().to_lowercase(),
            parsed.path().to_lowercase(),
        ),
        Err(_) => (String::new(), url.to_lowercase()),
    };

    let title_has = |words: &[&str]| words.iter().any(|w| title.contains(w));

    if BLOG_PATH_MARKERS.iter().any(|m| path.contains(m)) {
        ContentType::Blog
    } else if title_has(PODCAST_TITLE_WORDS) {
        ContentType::PodcastTranscript
    } else if title_has(CALL_TITLE_WORDS) {
        ContentType::CallTranscript
    } else if matches_any(PROFESSIONAL_NETWORK_HOSTS, &host) {
        ContentType::LinkedinPost
    } else if matches_any(FORUM_HOSTS, &host) {
        ContentType::RedditComment
    } else if title_has(BOOK_TITLE_WORDS) {
        ContentType::Book
    } else {
        ContentType::Other
    }
}
