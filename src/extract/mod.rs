//! Content extraction module
//!
//! This module turns raw page material into content records:
//! - Structural cleanup and main-content selection (`html`)
//! - Block/bot-wall detection and comment-phrase stripping (`block`)
//! - Blog listing splitting (`listing`)
//! - Content type classification (`classify`)
//! - The two extraction entry points and link extraction (`page`)

mod block;
mod classify;
pub(crate) mod html;
mod listing;
mod page;

pub use block::{is_block_page, is_throttle_page, needs_rendering, strip_comment_phrases};
pub use classify::classify;
pub use listing::{is_listing_root, ListingSettings};
pub use page::{extract_links, filter_links, title_from_url, PageExtractor, RenderedPage};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inferred kind of an extracted piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Blog,
    PodcastTranscript,
    CallTranscript,
    LinkedinPost,
    RedditComment,
    Book,
    Other,
}

impl ContentType {
    /// String form used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::PodcastTranscript => "podcast_transcript",
            Self::CallTranscript => "call_transcript",
            Self::LinkedinPost => "linkedin_post",
            Self::RedditComment => "reddit_comment",
            Self::Book => "book",
            Self::Other => "other",
        }
    }

    /// Returns all content types, in classification precedence order
    pub fn all() -> [ContentType; 7] {
        [
            Self::Blog,
            Self::PodcastTranscript,
            Self::CallTranscript,
            Self::LinkedinPost,
            Self::RedditComment,
            Self::Book,
            Self::Other,
        ]
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extracted piece of content
///
/// Records are only built by the extractor and never change afterwards, so
/// the fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    title: String,
    content: String,
    content_type: ContentType,
    source_url: String,
}

impl ContentRecord {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        content_type: ContentType,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            content_type,
            source_url: source_url.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Markdown (static pages) or plain text (rendered pages)
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}
