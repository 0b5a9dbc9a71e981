//! URL handling module for kb-crawler
//!
//! This module provides URL normalization, seed-domain scoping, wildcard host
//! matching, and the exclusion filter applied to discovered links.

mod domain;
mod filter;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, Scope};
pub use filter::{exclusion_reason, should_exclude, ExclusionReason};
pub use matcher::{matches_any, matches_wildcard};
pub use normalize::{normalize_against, normalize_url, resolve_url};
