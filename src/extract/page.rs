use crate::extract::block::{has_error_phrase, is_block_page, strip_comment_phrases};
use crate::extract::html;
use crate::extract::listing::{self, ListingSettings};
use crate::extract::{classify, ContentRecord};
use crate::url::{normalize_url, resolve_url, should_exclude, Scope};
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Output of a rendering session for one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Document title reported by the renderer
    pub title: Option<String>,

    /// Visible text of the rendered body
    pub text: String,

    /// Rendered DOM serialized as HTML, when the renderer can provide it
    pub html: Option<String>,
}

/// Turns static or rendered pages into content records
///
/// The extractor is stateless apart from its listing settings; one instance
/// serves a whole run.
#[derive(Debug, Clone, Default)]
pub struct PageExtractor {
    listing: ListingSettings,
}

impl PageExtractor {
    pub fn new(listing: ListingSettings) -> Self {
        Self { listing }
    }

    /// Extracts records from raw server HTML
    ///
    /// Content is converted to markdown. A listing root yields one record
    /// per detected post; every other page yields at most one record.
    pub fn extract_from_static_html(&self, raw_html: &str, url: &Url) -> Vec<ContentRecord> {
        let mut document = Html::parse_document(raw_html);
        html::strip_non_content(&mut document);

        if listing::is_listing_root(url) {
            let text = html::collapse_whitespace(&html::body_text(&document));
            let posts = self.listing_records(&text, &html::heading_texts(&document), url);
            if !posts.is_empty() {
                return posts;
            }
        }

        let title = html::extract_title(&document);
        let content = html::select_content(&document)
            .map(|region| html2md::parse_html(&region.html))
            .unwrap_or_default();

        self.finish(title, &content, url).into_iter().collect()
    }

    /// Extracts records from a rendered page
    ///
    /// Content stays plain text. When the renderer supplied the DOM, the same
    /// cleanup and content selection as the static path run on it; otherwise
    /// the renderer's visible text is used as is.
    pub fn extract_from_rendered_page(&self, page: &RenderedPage, url: &Url) -> Vec<ContentRecord> {
        let document = page.html.as_deref().map(|raw| {
            let mut document = Html::parse_document(raw);
            html::strip_non_content(&mut document);
            document
        });

        if listing::is_listing_root(url) {
            let (text, headings) = match &document {
                Some(doc) => (html::body_text(doc), html::heading_texts(doc)),
                None => (page.text.clone(), Vec::new()),
            };
            let text = html::collapse_whitespace(&text);
            let posts = self.listing_records(&text, &headings, url);
            if !posts.is_empty() {
                return posts;
            }
        }

        let title = page
            .title
            .as_deref()
            .map(html::single_line)
            .filter(|t| !t.is_empty())
            .or_else(|| document.as_ref().and_then(html::extract_title));

        let content = document
            .as_ref()
            .and_then(html::select_content)
            .map(|region| region.text)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| page.text.clone());

        self.finish(title, &content, url).into_iter().collect()
    }

    fn listing_records(&self, text: &str, headings: &[String], url: &Url) -> Vec<ContentRecord> {
        let markers = if self.listing.known_titles.is_empty() {
            listing::heading_markers(headings)
        } else {
            self.listing.known_titles.clone()
        };

        let posts = listing::split_posts(text, &markers, &self.listing);
        tracing::debug!(
            "Listing {} yielded {} posts from {} markers",
            url,
            posts.len(),
            markers.len()
        );

        posts
            .into_iter()
            .map(|(title, body)| {
                let kind = classify(&title, &body, url.as_str());
                ContentRecord::new(title, body, kind, url.as_str())
            })
            .collect()
    }

    fn finish(&self, title: Option<String>, content: &str, url: &Url) -> Option<ContentRecord> {
        let content =
            html::collapse_whitespace(&strip_comment_phrases(&html::collapse_whitespace(content)));
        let title = title.unwrap_or_default();

        if title.is_empty() && content.is_empty() {
            return None;
        }

        if is_block_page(&content) || has_error_phrase(&title) {
            tracing::debug!("Block page detected at {}", url);
            return None;
        }

        let title = if title.is_empty() {
            title_from_url(url)
        } else {
            title
        };
        let kind = classify(&title, &content, url.as_str());

        Some(ContentRecord::new(title, content, kind, url.as_str()))
    }
}

/// Synthesizes a title from a URL
///
/// Uses the last non-empty path segment with hyphens and underscores turned
/// into spaces and each word capitalized. The root path falls back to the
/// host.
pub fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.trim_end_matches(".html").trim_end_matches(".htm"));

    match segment {
        Some(segment) if !segment.is_empty() => segment
            .split(|c| c == '-' || c == '_')
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        _ => url.host_str().unwrap_or_default().to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Extracts crawlable links from raw HTML
///
/// See [`filter_links`] for the rules applied to each anchor.
pub fn extract_links(
    raw_html: &str,
    page_url: &Url,
    scope: &Scope,
    is_visited: impl Fn(&Url) -> bool,
) -> Vec<Url> {
    let document = Html::parse_document(raw_html);
    filter_links(html::anchor_hrefs(&document), page_url, scope, is_visited)
}

/// Resolves, filters and normalizes raw anchor targets
///
/// A target is kept when it resolves to an `http(s)` URL inside `scope`,
/// passes the exclusion filter, and its normalized form is neither visited
/// nor already kept. Page order is preserved.
pub fn filter_links<I, S>(
    hrefs: I,
    page_url: &Url,
    scope: &Scope,
    is_visited: impl Fn(&Url) -> bool,
) -> Vec<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs {
        let href = href.as_ref();
        if !html::is_followable_href(href) {
            continue;
        }

        let resolved = match resolve_url(href, page_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping link {}: {}", href, e);
                continue;
            }
        };

        if !scope.contains(&resolved) {
            tracing::debug!("Skipping out-of-scope link {}", resolved);
            continue;
        }

        if should_exclude(&resolved) {
            tracing::debug!("Filtered link {}", resolved);
            continue;
        }

        let normalized = match normalize_url(resolved.as_str()) {
            Ok(url) => url,
            Err(_) => continue,
        };

        if is_visited(&normalized) {
            continue;
        }

        if seen.insert(normalized.as_str().to_string()) {
            links.push(normalized);
        }
    }

    links
}
