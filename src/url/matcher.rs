/// Checks if a host matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "t.co" matches only "t.co"
/// 2. Wildcard match: "*.webflow.io" matches:
///    - "webflow.io" (the bare domain)
///    - "acme.webflow.io" (single subdomain)
///    - "preview.acme.webflow.io" (nested subdomains)
///
/// Hosts are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use kb_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("t.co", "t.co"));
/// assert!(!matches_wildcard("t.co", "at.co"));
///
/// assert!(matches_wildcard("*.webflow.io", "acme.webflow.io"));
/// assert!(!matches_wildcard("*.webflow.io", "webflow.io.evil.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base
            || (candidate.len() > base.len()
                && candidate.ends_with(base)
                && candidate.as_bytes()[candidate.len() - base.len() - 1] == b'.')
    } else {
        candidate == pattern
    }
}

/// Returns true if `candidate` matches any of `patterns`
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches_wildcard(pattern.as_ref(), candidate))
}
