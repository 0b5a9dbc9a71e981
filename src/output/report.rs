//! JSON report persistence

use crate::extract::ContentRecord;
use crate::CrawlError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Everything a run collected, in the shape written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    /// Seed URL of the run
    pub site: String,

    /// Accepted records in acceptance order
    pub items: Vec<ContentRecord>,
}

impl CrawlReport {
    pub fn new(site: impl Into<String>, items: Vec<ContentRecord>) -> Self {
        Self {
            site: site.into(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// File name for the report of a crawl seeded at `seed`
///
/// The host loses its `www.` prefix; the path has `/` replaced by `_`, with
/// leading and trailing underscores trimmed.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use kb_crawler::output::report_file_name;
///
/// let seed = Url::parse("https://www.quill.co/blog").unwrap();
/// assert_eq!(report_file_name(&seed), "quill.co_blog.json");
/// ```
pub fn report_file_name(seed: &Url) -> String {
    let domain = seed.host_str().unwrap_or("site").replace("www.", "");
    let domain = match seed.port() {
        Some(port) => format!("{}:{}", domain, port),
        None => domain,
    };
    let path = seed.path().replace('/', "_");
    let path = path.trim_matches('_');

    if path.is_empty() {
        format!("{}.json", domain)
    } else {
        format!("{}_{}.json", domain, path)
    }
}

/// Writes `report` as pretty JSON into `directory`
///
/// The directory is created if missing. Returns the path written.
pub fn write_report(
    report: &CrawlReport,
    seed: &Url,
    directory: &Path,
) -> Result<PathBuf, CrawlError> {
    std::fs::create_dir_all(directory)?;
    let path = directory.join(report_file_name(seed));

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    tracing::info!("Wrote {} items to {}", report.items.len(), path.display());
    Ok(path)
}
