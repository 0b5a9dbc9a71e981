use crate::extract::ContentRecord;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Traversal state owned by one crawl run
///
/// Holds the FIFO frontier, the visited set and the collected records. All
/// URLs stored here are already normalized; their string form is the dedup
/// key.
#[derive(Debug)]
pub struct CrawlState {
    /// URLs pending visit, in discovery order
    frontier: VecDeque<Url>,

    /// Every URL that has ever entered the frontier
    enqueued: HashSet<String>,

    /// URLs already dequeued and processed
    visited: HashSet<String>,

    /// `visited` in the order URLs were processed
    visit_order: Vec<String>,

    /// Accepted records, append-only
    results: Vec<ContentRecord>,

    /// Maximum number of records to collect
    page_budget: usize,

    /// Soft cap on the frontier length
    frontier_cap: usize,
}

impl CrawlState {
    /// Creates a state seeded with a single URL
    ///
    /// The frontier cap is twice the page budget.
    pub fn new(seed: Url, page_budget: usize) -> Self {
        let mut enqueued = HashSet::new();
        enqueued.insert(seed.as_str().to_string());

        Self {
            frontier: VecDeque::from([seed]),
            enqueued,
            visited: HashSet::new(),
            visit_order: Vec::new(),
            results: Vec::new(),
            page_budget,
            frontier_cap: page_budget.saturating_mul(2),
        }
    }

    /// Removes the next URL from the front of the frontier
    pub fn pop_front(&mut self) -> Option<Url> {
        self.frontier.pop_front()
    }

    /// Returns true if the URL has already been processed
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Marks a URL as visited
    ///
    /// Returns false if it was already visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        let key = url.as_str().to_string();
        if self.visited.insert(key.clone()) {
            self.visit_order.push(key);
            true
        } else {
            false
        }
    }

    /// Adds a discovered URL to the back of the frontier
    ///
    /// Visited URLs, URLs already enqueued, and anything arriving while the
    /// frontier is at its cap are dropped. Returns true if the URL was added.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if self.frontier.len() >= self.frontier_cap {
            return false;
        }
        if self.visited.contains(url.as_str()) || self.enqueued.contains(url.as_str()) {
            return false;
        }

        self.enqueued.insert(url.as_str().to_string());
        self.frontier.push_back(url);
        true
    }

    /// Appends records, truncating at the page budget
    ///
    /// Returns the number of records actually kept.
    pub fn push_records(&mut self, records: Vec<ContentRecord>) -> usize {
        let room = self.page_budget.saturating_sub(self.results.len());
        let kept = records.len().min(room);
        self.results.extend(records.into_iter().take(kept));
        kept
    }

    /// Returns true once the page budget has been met
    pub fn budget_reached(&self) -> bool {
        self.results.len() >= self.page_budget
    }

    /// Returns true if nothing is left to visit
    pub fn frontier_is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn frontier_cap(&self) -> usize {
        self.frontier_cap
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn results(&self) -> &[ContentRecord] {
        &self.results
    }

    /// Visited URLs in processing order
    pub fn visited(&self) -> &[String] {
        &self.visit_order
    }

    /// Consumes the state, returning the records and the visit order
    pub fn into_parts(self) -> (Vec<ContentRecord>, Vec<String>) {
        (self.results, self.visit_order)
    }
}
