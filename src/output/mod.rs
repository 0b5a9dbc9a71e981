//! Output module for crawl reports
//!
//! This module handles:
//! - The serialized report shape (`site` plus `items`)
//! - Naming and writing report files
//! - Per-content-type statistics for the end-of-run summary

mod report;
pub mod stats;

pub use report::{report_file_name, write_report, CrawlReport};
pub use stats::{print_statistics, ReportStatistics};
