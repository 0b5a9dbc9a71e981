//! Blog listing splitter
//!
//! A listing root such as `/blog` shows many posts on one page. The page text
//! is cut at post-title markers, and each slice between two markers becomes
//! a candidate post.

use crate::extract::block::is_block_page;
use std::collections::HashSet;
use url::Url;

const MARKER_MIN_CHARS: usize = 10;
const MARKER_MAX_CHARS: usize = 150;
const MARKER_MAX_WORDS: usize = 20;

/// Lines this short are navigation crumbs, dates or buttons
const MIN_LINE_CHARS: usize = 6;

/// Tunables for the listing splitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    /// Post titles to use as markers instead of detected headings
    pub known_titles: Vec<String>,

    /// Maximum number of posts taken from one listing page
    pub max_posts: usize,

    /// A post body must be longer than this many characters
    pub min_post_length: usize,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            known_titles: Vec::new(),
            max_posts: 8,
            min_post_length: 50,
        }
    }
}

/// Returns true if the URL path ends at a `/blog` root
pub fn is_listing_root(url: &Url) -> bool {
    url.path()
        .trim_end_matches('/')
        .to_lowercase()
        .ends_with("/blog")
}

/// Picks title-sized headings as post markers, deduplicated in order
pub(crate) fn heading_markers(headings: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();

    headings
        .iter()
        .filter(|heading| {
            let chars = heading.chars().count();
            (MARKER_MIN_CHARS..=MARKER_MAX_CHARS).contains(&chars)
                && heading.split_whitespace().count() <= MARKER_MAX_WORDS
        })
        .filter(|heading| seen.insert(heading.to_lowercase()))
        .cloned()
        .collect()
}

/// Splits listing text into `(title, body)` pairs
///
/// Each marker is located at its first occurrence in `text`; markers that
/// never occur, or that start inside an earlier marker, are skipped. A body
/// runs from the end of its marker to the start of the next one. Short lines
/// and "read more" links are dropped from each body, and bodies that are too
/// short or look like a block page are discarded.
pub(crate) fn split_posts(
    text: &str,
    markers: &[String],
    settings: &ListingSettings,
) -> Vec<(String, String)> {
    let mut found: Vec<(usize, &str)> = markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| text.find(m.as_str()).map(|pos| (pos, m.as_str())))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);

    let mut positioned: Vec<(usize, &str)> = Vec::with_capacity(found.len());
    for (pos, marker) in found {
        if let Some((prev_pos, prev)) = positioned.last() {
            if pos < prev_pos + prev.len() {
                continue;
            }
        }
        positioned.push((pos, marker));
    }

    let mut posts = Vec::new();
    for (i, (pos, marker)) in positioned.iter().enumerate() {
        let start = pos + marker.len();
        let end = positioned
            .get(i + 1)
            .map(|(next, _)| *next)
            .unwrap_or(text.len());

        let body = clean_body(&text[start..end]);
        if body.chars().count() > settings.min_post_length && !is_block_page(&body) {
            posts.push((marker.to_string(), body));
        }
        if posts.len() >= settings.max_posts {
            break;
        }
    }

    posts
}

fn clean_body(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
        .filter(|line| !line.to_lowercase().starts_with("read more"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST_ONE: &str = "Why Users Want Customer-Facing Analytics";
    const POST_TWO: &str = "Brief Overview of the Modern Data Stack";

    fn listing_text() -> String {
        [
            "Blog",
            POST_ONE,
            "October 3",
            "Customers expect dashboards inside the products they already pay for.",
            "Read more",
            POST_TWO,
            "July 12",
            "Warehouses, transformation tools and BI layers each solve one part of the problem.",
            "Read more",
        ]
        .join("\n")
    }

    #[test]
    fn test_is_listing_root() {
        let root = |s: &str| is_listing_root(&Url::parse(s).unwrap());
        assert!(root("https://example.test/blog"));
        assert!(root("https://example.test/blog/"));
        assert!(root("https://example.test/en/Blog"));
        assert!(!root("https://example.test/blog/first-post"));
        assert!(!root("https://example.test/"));
    }

    #[test]
    fn test_heading_markers_filter_and_dedup() {
        let headings = vec![
            "Blog".to_string(),
            POST_ONE.to_string(),
            POST_ONE.to_string(),
            "word ".repeat(25),
            POST_TWO.to_string(),
        ];
        assert_eq!(heading_markers(&headings), vec![POST_ONE, POST_TWO]);
    }

    #[test]
    fn test_split_posts_between_markers() {
        let markers = vec![POST_TWO.to_string(), POST_ONE.to_string()];
        let posts = split_posts(&listing_text(), &markers, &ListingSettings::default());

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].0, POST_ONE);
        assert_eq!(
            posts[0].1,
            "October 3\nCustomers expect dashboards inside the products they already pay for."
        );
        assert_eq!(posts[1].0, POST_TWO);
        assert!(!posts[1].1.contains("Read more"));
    }

    #[test]
    fn test_split_posts_drops_short_bodies() {
        let text = format!(
            "{}\nTiny.\n{}\n{}",
            POST_ONE,
            POST_TWO,
            "Long enough body text. ".repeat(4)
        );
        let markers = vec![POST_ONE.to_string(), POST_TWO.to_string()];
        let posts = split_posts(&text, &markers, &ListingSettings::default());

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, POST_TWO);
    }

    #[test]
    fn test_split_posts_respects_max_posts() {
        let body = "A body that easily clears the fifty character minimum.";
        let markers: Vec<String> = (0..12).map(|i| format!("Post number {:02} title", i)).collect();
        let text = markers
            .iter()
            .map(|m| format!("{}\n{}", m, body))
            .collect::<Vec<_>>()
            .join("\n");

        let posts = split_posts(&text, &markers, &ListingSettings::default());
        assert_eq!(posts.len(), 8);
    }

    #[test]
    fn test_split_posts_without_markers() {
        let posts = split_posts(&listing_text(), &[], &ListingSettings::default());
        assert!(posts.is_empty());

        let missing = vec!["A title that is not on the page".to_string()];
        assert!(split_posts(&listing_text(), &missing, &ListingSettings::default()).is_empty());
    }
}
