//! Analysis Orchestration
//!
//! [`UsageAnalyzer`] wires the pipeline together: scan the log tree, then
//! hand the flat collections to the aggregator or the transcript builder and
//! route results to the display layer. It owns the injected pieces (price
//! table, projects root, batch size) so the engine below it never touches
//! process-global configuration.
//!
//! The stats and transcript paths each perform their own independent tree
//! walk over the read-only log tree; there is no cached index, so results
//! always reflect the tree's current contents.

use crate::aggregator::UsageAggregator;
use crate::config::get_config;
use crate::display::DisplayManager;
use crate::models::{AggregatedStats, SessionDetail, TranscriptItem, UsageEntry};
use crate::pricing::PriceTable;
use crate::scanner::LogTreeScanner;
use crate::timestamp_parser::TimestampParser;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::warn;

/// Options shared by the report commands.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub json_output: bool,
    pub limit: Option<usize>,
    pub since_date: Option<DateTime<Utc>>,
    pub until_date: Option<DateTime<Utc>>,
}

pub struct UsageAnalyzer {
    prices: PriceTable,
    projects_dir: PathBuf,
    batch_size: usize,
    display: DisplayManager,
}

impl Default for UsageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageAnalyzer {
    /// Analyzer over the configured projects root with built-in prices.
    pub fn new() -> Self {
        let config = get_config();
        Self::with_parts(
            PriceTable::builtin(),
            config.projects_dir(),
            config.scan.batch_size,
        )
    }

    /// Fully injected constructor, the seam tests and embedders use.
    pub fn with_parts(prices: PriceTable, projects_dir: PathBuf, batch_size: usize) -> Self {
        Self {
            prices,
            projects_dir,
            batch_size,
            display: DisplayManager::new(),
        }
    }

    pub fn projects_dir(&self) -> &PathBuf {
        &self.projects_dir
    }

    /// Scan and aggregate the whole tree.
    pub async fn stats(&self, options: &ReportOptions) -> AggregatedStats {
        let entries = self.scan_entries(options).await;
        UsageAggregator::aggregate(&entries)
    }

    /// Scan and roll up per-session details.
    pub async fn sessions(&self, options: &ReportOptions) -> Vec<SessionDetail> {
        let entries = self.scan_entries(options).await;
        let mut details = UsageAggregator::session_details(&entries);
        if let Some(limit) = options.limit {
            details.truncate(limit);
        }
        details
    }

    /// Reconstruct one session's transcript.
    pub async fn transcript(&self, session_id: &str) -> Vec<TranscriptItem> {
        let scanner = self.scanner();
        let records = scanner.scan_session(&self.projects_dir, session_id).await;
        crate::transcript::TranscriptBuilder::build(records)
    }

    pub async fn run_stats(&self, options: ReportOptions) -> Result<()> {
        let stats = self.stats(&options).await;
        if stats.by_model.is_empty() && !options.json_output {
            warn!(projects_dir = %self.projects_dir.display(), "no usage data found");
        }
        self.display.display_stats(&stats, options.json_output)
    }

    pub async fn run_sessions(&self, options: ReportOptions) -> Result<()> {
        let details = self.sessions(&options).await;
        self.display.display_sessions(&details, options.json_output)
    }

    pub async fn run_transcript(&self, session_id: &str, options: ReportOptions) -> Result<()> {
        let items = self.transcript(session_id).await;
        self.display
            .display_transcript(session_id, &items, options.json_output)
    }

    fn scanner(&self) -> LogTreeScanner<'_> {
        LogTreeScanner::new(&self.prices).with_batch_size(self.batch_size)
    }

    async fn scan_entries(&self, options: &ReportOptions) -> Vec<UsageEntry> {
        let scanner = self.scanner();
        let mut entries = scanner.scan_usage(&self.projects_dir).await;
        if options.since_date.is_some() || options.until_date.is_some() {
            entries.retain(|e| in_date_range(e, options));
        }
        entries
    }
}

/// Calendar-date filtering for --since/--until. Entries without a parsable
/// timestamp cannot be proven in range and are excluded once a filter is set.
fn in_date_range(entry: &UsageEntry, options: &ReportOptions) -> bool {
    let Some(ts) = entry.timestamp.as_deref() else {
        return false;
    };
    let Ok(parsed) = TimestampParser::parse(ts) else {
        return false;
    };
    let date = parsed.date_naive();
    if let Some(since) = options.since_date {
        if date < since.date_naive() {
            return false;
        }
    }
    if let Some(until) = options.until_date {
        if date > until.date_naive() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenUsage;

    fn entry(timestamp: Option<&str>) -> UsageEntry {
        UsageEntry {
            timestamp: timestamp.map(String::from),
            model: "m".to_string(),
            usage: TokenUsage::default(),
            cost: 0.0,
            session_id: "s".to_string(),
            project_path: "p".to_string(),
            message_id: None,
        }
    }

    fn at(date: &str) -> DateTime<Utc> {
        TimestampParser::parse(&format!("{}T00:00:00Z", date)).unwrap()
    }

    #[test]
    fn test_date_range_filter() {
        let options = ReportOptions {
            since_date: Some(at("2024-02-01")),
            until_date: Some(at("2024-02-28")),
            ..Default::default()
        };
        assert!(in_date_range(&entry(Some("2024-02-15T10:00:00Z")), &options));
        assert!(!in_date_range(&entry(Some("2024-01-31T23:59:59Z")), &options));
        assert!(!in_date_range(&entry(Some("2024-03-01T00:00:00Z")), &options));
        assert!(!in_date_range(&entry(None), &options));
        assert!(!in_date_range(&entry(Some("garbage")), &options));
    }
}
