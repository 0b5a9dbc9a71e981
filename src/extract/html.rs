//! HTML helpers shared by both extraction entry points
//!
//! This module handles:
//! - Removing non-content structure and comment sections
//! - Locating the main content region
//! - Turning an element into block-aware plain text
//! - Collecting raw anchor targets

use scraper::{ElementRef, Html, Node, Selector};

/// Elements that never contribute readable content
const STRUCTURAL_SELECTOR: &str =
    "script, style, noscript, template, iframe, svg, nav, header, footer, aside, form";

/// Sectioning elements whose nested `<header>` belongs to the content
const SECTIONING_TAGS: &[&str] = &["article", "main"];

/// Elements the comment heuristic must never remove
const PROTECTED_TAGS: &[&str] = &["html", "body", "main", "article"];

/// Class/id fragments that mark comment and discussion sections
const COMMENT_MARKERS: &[&str] = &["comment", "discussion", "disqus"];

/// Class/id tokens that mark comment sections when matched exactly
const COMMENT_TOKENS: &[&str] = &["respond", "replies", "reply-form"];

/// Elements whose text is never visible
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Main-content selectors, in priority order
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".content",
    ".post-content",
    ".entry-content",
    ".blog-content",
    ".article-content",
    ".page-content",
];

/// Elements that start a new line in block-aware text
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul",
    "ol", "br", "tr", "table", "blockquote", "pre", "dt", "dd", "figcaption", "hr",
];

/// The selected main-content region of a page
#[derive(Debug, Clone)]
pub struct ContentRegion {
    /// Outer HTML of every matched element, joined
    pub html: String,

    /// Block-aware text of every matched element, joined
    pub text: String,
}

/// Removes non-content structure and comment subtrees in place
///
/// A `<header>` inside an `<article>` or `<main>` carries the post title
/// (e.g. `entry-header` on listing pages) and is kept.
pub fn strip_non_content(document: &mut Html) {
    let mut doomed = Vec::new();

    if let Ok(selector) = Selector::parse(STRUCTURAL_SELECTOR) {
        doomed.extend(
            document
                .select(&selector)
                .filter(|element| !is_content_header(element))
                .map(|element| element.id()),
        );
    }

    if let Ok(selector) = Selector::parse("[class], [id]") {
        doomed.extend(
            document
                .select(&selector)
                .filter(|element| is_comment_container(element))
                .map(|element| element.id()),
        );
    }

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn is_content_header(element: &ElementRef<'_>) -> bool {
    element.value().name() == "header"
        && element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| SECTIONING_TAGS.contains(&ancestor.value().name()))
}

fn is_comment_container(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if PROTECTED_TAGS.contains(&value.name()) {
        return false;
    }

    value
        .attr("id")
        .into_iter()
        .chain(value.classes())
        .map(str::to_lowercase)
        .any(|token| {
            COMMENT_MARKERS.iter().any(|m| token.contains(m))
                || COMMENT_TOKENS.contains(&token.as_str())
        })
}

/// Extracts the page title from the `<title>` element
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| single_line(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Finds the main content region
///
/// The first selector in [`CONTENT_SELECTORS`] whose matches contain any text
/// wins; all of its matches are joined. Falls back to the whole body.
pub fn select_content(document: &Html) -> Option<ContentRegion> {
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let matches: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if matches.is_empty() {
            continue;
        }

        let text = matches
            .iter()
            .map(|element| block_text(*element))
            .collect::<Vec<_>>()
            .join("\n");

        if !text.trim().is_empty() {
            let html = matches
                .iter()
                .map(|element| element.html())
                .collect::<Vec<_>>()
                .join("\n");
            return Some(ContentRegion { html, text });
        }
    }

    body(document).map(|element| ContentRegion {
        html: element.inner_html(),
        text: block_text(element),
    })
}

/// Block-aware text of the whole body (or the document, if it has no body)
pub fn body_text(document: &Html) -> String {
    match body(document) {
        Some(element) => block_text(element),
        None => block_text(document.root_element()),
    }
}

fn body(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body").ok()?;
    document.select(&selector).next()
}

/// Collects descendant text, starting a new line at each block element
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }

    out
}

/// Visible body text, skipping script-like elements without removing them
pub fn visible_text(document: &Html) -> String {
    let Some(root) = body(document) else {
        return String::new();
    };

    let mut out = String::new();
    for node in root.descendants() {
        match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .map_or(false, |el| HIDDEN_TAGS.contains(&el.name()))
                });
                if !hidden {
                    out.push_str(text);
                }
            }
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => out.push('\n'),
            _ => {}
        }
    }

    collapse_whitespace(&out)
}

/// Texts of `h1`-`h3` headings in document order
pub fn heading_texts(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("h1, h2, h3") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| single_line(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Collapses whitespace runs within lines and runs of blank lines
///
/// Every line is trimmed and its internal whitespace reduced to single
/// spaces; consecutive blank lines become one, and leading/trailing blank
/// lines are dropped.
pub fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for raw in text.lines() {
        let line = single_line(raw);
        if line.is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Joins all whitespace-separated words with single spaces
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collects raw anchor targets worth resolving
///
/// Skips `download` anchors, fragment-only links, and `javascript:`,
/// `mailto:`, `tel:` and `data:` targets.
pub fn anchor_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable_href(href))
        .map(str::to_string)
        .collect()
}

/// Returns false for empty, fragment-only and non-navigational hrefs
pub fn is_followable_href(href: &str) -> bool {
    let lower = href.trim().to_lowercase();
    !(lower.is_empty()
        || lower.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
