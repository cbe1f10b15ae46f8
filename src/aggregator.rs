//! Usage Aggregation
//!
//! Single-pass rollups over the flat entry collection produced by the
//! scanner: grand totals plus per-model, per-date and per-project breakdowns,
//! and the per-session detail rows used by the sessions report.
//!
//! Output ordering is a hard contract consumed directly for display:
//! `by_model` and `by_project` descend by total cost (name-ascending on
//! ties, so repeated runs over an unchanged tree are bit-identical),
//! `by_date` ascends by calendar date with the literal `"unknown"` bucket
//! last, and session details are most-recently-active first.

use crate::models::{
    AggregatedStats, BreakdownTotals, DateStats, ModelStats, ProjectStats, SessionDetail,
    TokenUsage, UsageEntry,
};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct Bucket {
    tokens: TokenUsage,
    cost: f64,
    sessions: HashSet<String>,
}

impl Bucket {
    fn absorb(&mut self, entry: &UsageEntry) {
        self.tokens.add(&entry.usage);
        self.cost += entry.cost;
        self.sessions.insert(entry.session_id.clone());
    }

    fn into_totals(self) -> BreakdownTotals {
        BreakdownTotals {
            total_tokens: self.tokens.total(),
            tokens: self.tokens,
            total_cost: self.cost,
            session_count: self.sessions.len(),
        }
    }
}

pub struct UsageAggregator;

impl UsageAggregator {
    /// Roll the flat entry collection up into totals and the three sorted
    /// breakdowns. Empty input yields zeroed stats with empty lists.
    pub fn aggregate(entries: &[UsageEntry]) -> AggregatedStats {
        let mut totals = TokenUsage::default();
        let mut total_cost = 0.0;
        let mut sessions: HashSet<&str> = HashSet::new();

        let mut by_model: HashMap<String, Bucket> = HashMap::new();
        let mut by_date: HashMap<String, Bucket> = HashMap::new();
        let mut by_project: HashMap<String, Bucket> = HashMap::new();

        for entry in entries {
            totals.add(&entry.usage);
            total_cost += entry.cost;
            sessions.insert(&entry.session_id);

            by_model
                .entry(entry.model.clone())
                .or_default()
                .absorb(entry);
            by_date
                .entry(TimestampParser::date_key(entry.timestamp.as_deref()))
                .or_default()
                .absorb(entry);
            by_project
                .entry(entry.project_path.clone())
                .or_default()
                .absorb(entry);
        }

        let mut model_rows: Vec<ModelStats> = by_model
            .into_iter()
            .map(|(model, bucket)| ModelStats {
                model,
                totals: bucket.into_totals(),
            })
            .collect();
        model_rows.sort_by(|a, b| {
            b.totals
                .total_cost
                .total_cmp(&a.totals.total_cost)
                .then_with(|| a.model.cmp(&b.model))
        });

        let mut date_rows: Vec<DateStats> = by_date
            .into_iter()
            .map(|(date, bucket)| DateStats {
                date,
                totals: bucket.into_totals(),
            })
            .collect();
        // ISO date strings sort lexicographically; "unknown" lands last.
        date_rows.sort_by(|a, b| a.date.cmp(&b.date));

        let mut project_rows: Vec<ProjectStats> = by_project
            .into_iter()
            .map(|(project_path, bucket)| ProjectStats {
                project_path,
                totals: bucket.into_totals(),
            })
            .collect();
        project_rows.sort_by(|a, b| {
            b.totals
                .total_cost
                .total_cmp(&a.totals.total_cost)
                .then_with(|| a.project_path.cmp(&b.project_path))
        });

        AggregatedStats {
            total_cost,
            total_tokens: totals.total(),
            tokens: totals,
            session_count: sessions.len(),
            by_model: model_rows,
            by_date: date_rows,
            by_project: project_rows,
        }
    }

    /// Per-session rollups, most recently active first. Sessions whose
    /// timestamps never parse sort last.
    pub fn session_details(entries: &[UsageEntry]) -> Vec<SessionDetail> {
        struct SessionAccum {
            project_path: String,
            tokens: TokenUsage,
            cost: f64,
            count: usize,
            first: Option<(DateTime<Utc>, String)>,
            last: Option<(DateTime<Utc>, String)>,
            models: HashSet<String>,
        }

        let mut by_session: HashMap<String, SessionAccum> = HashMap::new();

        for entry in entries {
            let accum = by_session
                .entry(entry.session_id.clone())
                .or_insert_with(|| SessionAccum {
                    project_path: entry.project_path.clone(),
                    tokens: TokenUsage::default(),
                    cost: 0.0,
                    count: 0,
                    first: None,
                    last: None,
                    models: HashSet::new(),
                });

            accum.tokens.add(&entry.usage);
            accum.cost += entry.cost;
            accum.count += 1;
            accum.models.insert(entry.model.clone());

            if let Some(ts) = entry.timestamp.as_deref() {
                if let Ok(parsed) = TimestampParser::parse(ts) {
                    if accum.first.as_ref().map_or(true, |(dt, _)| parsed < *dt) {
                        accum.first = Some((parsed, ts.to_string()));
                    }
                    if accum.last.as_ref().map_or(true, |(dt, _)| parsed > *dt) {
                        accum.last = Some((parsed, ts.to_string()));
                    }
                }
            }
        }

        let mut details: Vec<(Option<DateTime<Utc>>, SessionDetail)> = by_session
            .into_iter()
            .map(|(session_id, accum)| {
                let last_parsed = accum.last.as_ref().map(|(dt, _)| *dt);
                let mut models: Vec<String> = accum.models.into_iter().collect();
                models.sort();
                (
                    last_parsed,
                    SessionDetail {
                        session_id,
                        project_path: accum.project_path,
                        total_tokens: accum.tokens.total(),
                        tokens: accum.tokens,
                        total_cost: accum.cost,
                        message_count: accum.count,
                        first_timestamp: accum.first.map(|(_, raw)| raw),
                        last_timestamp: accum.last.map(|(_, raw)| raw),
                        models_used: models,
                    },
                )
            })
            .collect();

        details.sort_by(|(a_ts, a), (b_ts, b)| {
            b_ts.cmp(a_ts)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });

        details.into_iter().map(|(_, detail)| detail).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        session: &str,
        model: &str,
        project: &str,
        timestamp: Option<&str>,
        input: u64,
        cost: f64,
    ) -> UsageEntry {
        UsageEntry {
            timestamp: timestamp.map(String::from),
            model: model.to_string(),
            usage: TokenUsage {
                input_tokens: input,
                output_tokens: 0,
                cache_creation_tokens: 0,
                cache_read_tokens: 0,
            },
            cost,
            session_id: session.to_string(),
            project_path: project.to_string(),
            message_id: None,
        }
    }

    #[test]
    fn test_empty_input_yields_zeroed_stats() {
        let stats = UsageAggregator::aggregate(&[]);
        assert_eq!(stats.total_cost, 0.0);
        assert_eq!(stats.total_tokens, 0);
        assert_eq!(stats.session_count, 0);
        assert!(stats.by_model.is_empty());
        assert!(stats.by_date.is_empty());
        assert!(stats.by_project.is_empty());
    }

    #[test]
    fn test_partition_property() {
        let entries = vec![
            entry("s1", "a", "p1", Some("2024-01-01T00:00:00Z"), 100, 1.0),
            entry("s2", "b", "p2", Some("2024-01-02T00:00:00Z"), 200, 2.0),
            entry("s1", "a", "p1", None, 300, 4.0),
        ];
        let stats = UsageAggregator::aggregate(&entries);
        assert_eq!(stats.total_tokens, 600);
        assert_eq!(stats.session_count, 2);
        let model_sum: u64 = stats.by_model.iter().map(|m| m.totals.total_tokens).sum();
        assert_eq!(model_sum, stats.total_tokens);
        let date_sum: u64 = stats.by_date.iter().map(|d| d.totals.total_tokens).sum();
        assert_eq!(date_sum, stats.total_tokens);
    }

    #[test]
    fn test_ordering_contract() {
        let entries = vec![
            entry("s1", "cheap", "p-low", Some("2024-03-02T00:00:00Z"), 10, 0.5),
            entry("s2", "pricey", "p-high", Some("2024-03-01T00:00:00Z"), 10, 5.0),
            entry("s3", "mid", "p-mid", None, 10, 2.0),
        ];
        let stats = UsageAggregator::aggregate(&entries);

        let costs: Vec<f64> = stats.by_model.iter().map(|m| m.totals.total_cost).collect();
        assert!(costs.windows(2).all(|w| w[0] >= w[1]));

        let dates: Vec<&str> = stats.by_date.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "unknown"]);
    }

    #[test]
    fn test_distinct_session_counts_per_row() {
        let entries = vec![
            entry("s1", "a", "p1", None, 1, 0.0),
            entry("s1", "a", "p1", None, 1, 0.0),
            entry("s2", "a", "p1", None, 1, 0.0),
        ];
        let stats = UsageAggregator::aggregate(&entries);
        assert_eq!(stats.by_model[0].totals.session_count, 2);
        assert_eq!(stats.by_project[0].totals.session_count, 2);
    }

    #[test]
    fn test_session_details_ordering_and_rollup() {
        let entries = vec![
            entry("old", "a", "p1", Some("2024-01-01T00:00:00Z"), 10, 1.0),
            entry("recent", "b", "p2", Some("2024-06-01T00:00:00Z"), 20, 2.0),
            entry("recent", "a", "p2", Some("2024-06-02T00:00:00Z"), 30, 3.0),
        ];
        let details = UsageAggregator::session_details(&entries);
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].session_id, "recent");
        assert_eq!(details[0].message_count, 2);
        assert_eq!(details[0].total_tokens, 50);
        assert_eq!(details[0].models_used, vec!["a", "b"]);
        assert_eq!(
            details[0].first_timestamp.as_deref(),
            Some("2024-06-01T00:00:00Z")
        );
        assert_eq!(
            details[0].last_timestamp.as_deref(),
            Some("2024-06-02T00:00:00Z")
        );
        assert_eq!(details[1].session_id, "old");
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let entries = vec![
            entry("s1", "a", "p1", Some("2024-01-01T00:00:00Z"), 1, 1.0),
            entry("s2", "b", "p2", Some("2024-01-01T00:00:00Z"), 2, 1.0),
            entry("s3", "c", "p3", Some("2024-01-02T00:00:00Z"), 3, 1.0),
        ];
        let first = UsageAggregator::aggregate(&entries);
        let second = UsageAggregator::aggregate(&entries);
        assert_eq!(first, second);
    }
}
