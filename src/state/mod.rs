//! State module for tracking crawl progress
//!
//! This module provides the state owned by a single crawl run.
//!
//! # Components
//!
//! - `RunStatus`: lifecycle of a run (idle, running, completed, cancelled, failed)
//! - `CrawlState`: frontier, visited set and collected records for one run

mod crawl_state;
mod run_status;

// Re-export main types
pub use crawl_state::CrawlState;
pub use run_status::RunStatus;
