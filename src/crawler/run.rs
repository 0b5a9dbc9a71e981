//! Run handle, progress counters and the log-line side channel

use crate::output::CrawlReport;
use crate::state::RunStatus;
use crate::CrawlError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One timestamped progress message from a running crawl
#[derive(Debug, Clone)]
pub struct LogLine {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogLine {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Live counters shared between a run and its handle
#[derive(Debug, Default)]
pub struct RunProgress {
    visited: AtomicUsize,
    results: AtomicUsize,
    running: AtomicBool,
    cancelled: AtomicBool,
}

/// Point-in-time copy of [`RunProgress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub visited_count: usize,
    pub result_count: usize,
    pub running: bool,
}

impl RunProgress {
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            visited_count: self.visited.load(Ordering::Relaxed),
            result_count: self.results.load(Ordering::Relaxed),
            running: self.running.load(Ordering::Relaxed),
        }
    }

    /// Requests cancellation; the run stops at its next iteration
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn record_counts(&self, visited: usize, results: usize) {
        self.visited.store(visited, Ordering::Relaxed);
        self.results.store(results, Ordering::Relaxed);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }
}

/// Final result of a run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Terminal status
    pub status: RunStatus,

    /// Collected records, ready for persistence
    pub report: CrawlReport,

    /// Every processed URL, in visit order
    pub visited: Vec<String>,
}

/// Handle to a crawl running on the tokio runtime
#[derive(Debug)]
pub struct RunHandle {
    progress: Arc<RunProgress>,
    task: JoinHandle<CrawlOutcome>,
}

impl RunHandle {
    pub(crate) fn new(progress: Arc<RunProgress>, task: JoinHandle<CrawlOutcome>) -> Self {
        Self { progress, task }
    }

    /// Requests cooperative cancellation
    pub fn cancel(&self) {
        self.progress.cancel();
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Shared counters, for watching the run from another task
    pub fn progress_handle(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to reach a terminal status
    pub async fn join(self) -> Result<CrawlOutcome, CrawlError> {
        self.task
            .await
            .map_err(|e| CrawlError::Task(e.to_string()))
    }
}
