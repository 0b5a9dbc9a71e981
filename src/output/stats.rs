//! Statistics over a finished crawl report
//!
//! This module provides functionality for summarizing a report by content
//! type and printing that summary at the end of a run.

use crate::extract::ContentType;
use crate::output::CrawlReport;
use std::collections::{HashMap, HashSet};

/// Report statistics summary
#[derive(Debug, Clone, Default)]
pub struct ReportStatistics {
    /// Total number of records
    pub total_items: usize,

    /// Count of records by content type
    pub items_by_type: HashMap<ContentType, usize>,

    /// Number of distinct source URLs the records came from
    pub source_pages: usize,

    /// Total characters of content across all records
    pub total_chars: usize,
}

impl ReportStatistics {
    /// Summarizes a report
    pub fn from_report(report: &CrawlReport) -> Self {
        let mut items_by_type = HashMap::new();
        let mut sources = HashSet::new();
        let mut total_chars = 0;

        for item in &report.items {
            *items_by_type.entry(item.content_type()).or_insert(0) += 1;
            sources.insert(item.source_url());
            total_chars += item.content().chars().count();
        }

        Self {
            total_items: report.items.len(),
            items_by_type,
            source_pages: sources.len(),
            total_chars,
        }
    }

    pub fn count(&self, content_type: ContentType) -> usize {
        self.items_by_type.get(&content_type).copied().unwrap_or(0)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ReportStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Items collected: {}", stats.total_items);
    println!("  Source pages: {}", stats.source_pages);
    println!("  Content characters: {}", stats.total_chars);
    println!();

    if stats.total_items == 0 {
        return;
    }

    println!("Items by Type:");
    // Sort types by count (descending), ties in precedence order
    let mut type_counts: Vec<_> = ContentType::all()
        .into_iter()
        .map(|t| (t, stats.count(t)))
        .filter(|(_, count)| *count > 0)
        .collect();
    type_counts.sort_by(|a, b| b.1.cmp(&a.1));

    for (content_type, count) in type_counts {
        let percentage = (count as f64 / stats.total_items as f64) * 100.0;
        println!("  {}: {} ({:.1}%)", content_type, count, percentage);
    }
    println!();
}
