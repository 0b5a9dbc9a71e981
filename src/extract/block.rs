//! Block-page detection and residual comment-phrase removal

use crate::extract::html;
use lazy_regex::regex;
use scraper::{Html, Selector};

/// Phrases that mark an error, rate-limit or bot-wall page
const ERROR_PHRASES: &[&str] = &[
    "too many requests",
    "access denied",
    "404 not found",
    "page not found",
    "403 forbidden",
    "checking your browser",
    "verify you are human",
    "are you a robot",
    "unusual traffic",
    "attention required",
    "request blocked",
    "rate limit exceeded",
    "service unavailable",
];

/// Phrases that mark a "this page needs JavaScript" notice
const SCRIPT_NOTICE_PHRASES: &[&str] = &[
    "requires javascript",
    "enable javascript",
    "javascript is required",
    "javascript is disabled",
    "turn on javascript",
];

/// Above this many characters a script notice is treated as incidental
const SCRIPT_NOTICE_LIMIT: usize = 1000;

/// Visible text below which an empty app mount suggests client rendering
const EMPTY_MOUNT_LIMIT: usize = 200;

const APP_MOUNT_SELECTOR: &str = "#root, #__next, #app";

/// Phrases of a throttling or challenge page served with a success status
const THROTTLE_PHRASES: &[&str] = &[
    "too many requests",
    "rate limit exceeded",
    "unusual traffic",
    "checking your browser",
    "verify you are human",
    "are you a robot",
];

/// Longer pages that mention a throttle phrase are real content
const THROTTLE_PAGE_LIMIT: usize = 500;

/// Returns true if the text contains a known error or bot-wall phrase
pub(crate) fn has_error_phrase(text: &str) -> bool {
    let lower = text.to_lowercase();
    ERROR_PHRASES.iter().any(|p| lower.contains(p))
}

fn mentions_script_notice(lower: &str) -> bool {
    SCRIPT_NOTICE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Returns true if extracted content is an error or bot-wall page
///
/// Empty content always counts. A script notice only counts while the
/// content is short; long pages that merely mention JavaScript are kept.
pub fn is_block_page(content: &str) -> bool {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return true;
    }

    if has_error_phrase(trimmed) {
        return true;
    }

    mentions_script_notice(&trimmed.to_lowercase())
        && trimmed.chars().count() <= SCRIPT_NOTICE_LIMIT
}

/// Returns true if a statically fetched page should be rendered instead
pub fn needs_rendering(raw_html: &str) -> bool {
    let mut document = Html::parse_document(raw_html);
    let mounts_empty = Selector::parse(APP_MOUNT_SELECTOR)
        .map(|selector| {
            document
                .select(&selector)
                .any(|mount| mount.text().all(|t| t.trim().is_empty()))
        })
        .unwrap_or(false);

    html::strip_non_content(&mut document);
    let visible = html::collapse_whitespace(&html::body_text(&document));
    let visible_len = visible.chars().count();

    (mentions_script_notice(&raw_html.to_lowercase()) && visible_len < SCRIPT_NOTICE_LIMIT)
        || (mounts_empty && visible_len < EMPTY_MOUNT_LIMIT)
}

/// Returns true if a successful response is really a throttle or challenge
///
/// Such pages are retried with backoff like an HTTP 429.
pub fn is_throttle_page(raw_html: &str) -> bool {
    let mut document = Html::parse_document(raw_html);
    html::strip_non_content(&mut document);
    let visible = html::collapse_whitespace(&html::body_text(&document));
    if visible.chars().count() > THROTTLE_PAGE_LIMIT {
        return false;
    }

    let lower = format!(
        "{} {}",
        html::extract_title(&document).unwrap_or_default(),
        visible
    )
    .to_lowercase();
    THROTTLE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Removes leftover comment-widget phrases from extracted text
pub fn strip_comment_phrases(text: &str) -> String {
    let re = regex!(
        r"(?ix)
        \b(?:
            leave\ a\ (?:comment|reply)
            | post\ a\ comment
            | add\ a\ comment
            | join\ the\ discussion
            | be\ the\ first\ to\ comment
            | no\ comments\ yet
            | (?:load|show|view)\ (?:more\ |all\ )?comments
            | \d+\ comments?
        )\b
        | \bcomments?\s*\(\d+\)"
    );
    re.replace_all(text, "").into_owned()
}
