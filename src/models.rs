//! Core Data Models
//!
//! Data structures for the full pipeline: raw JSONL records as they appear in
//! session log files, qualified usage entries with computed cost, aggregated
//! statistics for display/JSON output, and reconstructed transcript messages.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`RawRecord`] - one JSONL line, tolerantly deserialized
//! 2. **Classification**: [`LogRecord`] - tagged union resolved once at parse time
//! 3. **Usage**: [`UsageEntry`] - qualifying records with cost attached
//! 4. **Aggregation**: [`AggregatedStats`], [`SessionDetail`] - rollups for reports
//! 5. **Transcripts**: [`TranscriptMessage`], [`VersionedMessage`] - conversation view
//!
//! All report-facing types serialize with camelCase field names so the JSON
//! output can be consumed directly by other presentation layers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSONL line as written by the CLI tool. Every field is optional: log
/// schemas drift across tool versions and lines must never fail to classify
/// just because a field is missing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub message: Option<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub id: Option<String>,
    pub role: Option<String>,
    pub model: Option<String>,
    pub usage: Option<RawUsage>,
    pub content: Option<Value>,
}

/// Token counters as serialized by the tool. Kept signed here because
/// corrupted lines have been observed carrying negative counts; clamping
/// happens in [`TokenUsage::from_raw`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUsage {
    #[serde(default)]
    pub input_tokens: Option<i64>,
    #[serde(default)]
    pub output_tokens: Option<i64>,
    #[serde(default)]
    pub cache_creation_input_tokens: Option<i64>,
    #[serde(default)]
    pub cache_read_input_tokens: Option<i64>,
}

/// The four billable token categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
}

impl TokenUsage {
    pub fn from_raw(raw: &RawUsage) -> Self {
        let clamp = |v: Option<i64>| v.unwrap_or(0).max(0) as u64;
        Self {
            input_tokens: clamp(raw.input_tokens),
            output_tokens: clamp(raw.output_tokens),
            cache_creation_tokens: clamp(raw.cache_creation_input_tokens),
            cache_read_tokens: clamp(raw.cache_read_input_tokens),
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
    }
}

/// Full message payload shared by the stats and transcript consumers.
/// Usage-bearing and plain records both reduce to this shape.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub session_id: String,
    pub timestamp: Option<String>,
    pub record_type: Option<String>,
    pub message_id: Option<String>,
    pub role: Option<String>,
    pub model: Option<String>,
    pub content: Vec<Value>,
    pub usage: Option<TokenUsage>,
}

/// Classification of one log line, resolved once at parse time.
#[derive(Debug, Clone)]
pub enum LogRecord {
    /// Carries a usage object with at least one non-zero token counter.
    UsageBearing(Box<MessageRecord>),
    /// A well-formed message without qualifying usage (plain user/assistant
    /// turns, pure tool-result echoes). Visible to transcripts only.
    PlainMessage(Box<MessageRecord>),
    /// Blank, non-JSON, or shaped like nothing we know.
    Unrecognized,
}

/// One qualifying usage record with its computed cost.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub timestamp: Option<String>,
    pub model: String,
    #[serde(flatten)]
    pub usage: TokenUsage,
    pub cost: f64,
    pub session_id: String,
    pub project_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl UsageEntry {
    pub fn total_tokens(&self) -> u64 {
        self.usage.total()
    }
}

/// Per-model price row, USD per 1,000,000 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrice {
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

impl ModelPrice {
    pub const ZERO: ModelPrice = ModelPrice {
        input: 0.0,
        output: 0.0,
        cache_write: 0.0,
        cache_read: 0.0,
    };
}

/// Shared shape of the byModel/byDate/byProject breakdown rows.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownTotals {
    #[serde(flatten)]
    pub tokens: TokenUsage,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub session_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub model: String,
    #[serde(flatten)]
    pub totals: BreakdownTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateStats {
    pub date: String,
    #[serde(flatten)]
    pub totals: BreakdownTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub project_path: String,
    #[serde(flatten)]
    pub totals: BreakdownTotals,
}

/// Grand totals plus the three sorted breakdowns.
///
/// Ordering is part of the contract: `by_model` and `by_project` descend by
/// cost, `by_date` ascends by calendar date.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub total_cost: f64,
    #[serde(flatten)]
    pub tokens: TokenUsage,
    pub total_tokens: u64,
    pub session_count: usize,
    pub by_model: Vec<ModelStats>,
    pub by_date: Vec<DateStats>,
    pub by_project: Vec<ProjectStats>,
}

/// Per-session rollup, sorted most recently active first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_id: String,
    pub project_path: String,
    #[serde(flatten)]
    pub tokens: TokenUsage,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub message_count: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub models_used: Vec<String>,
}

/// One reconstructed conversational turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub id: String,
    pub timestamp: Option<String>,
    pub session_id: String,
    pub role: String,
    pub content: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Set when the role was remapped (user turn carrying a tool_result block).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_role: Option<String>,
}

/// A turn that was re-emitted with edited content: the first version's fields
/// plus the ordered edit history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedMessage {
    #[serde(flatten)]
    pub head: TranscriptMessage,
    pub is_versioned: bool,
    pub versions: Vec<TranscriptMessage>,
    pub current_version: usize,
    pub total_versions: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TranscriptItem {
    Single(TranscriptMessage),
    Versioned(VersionedMessage),
}

impl TranscriptItem {
    /// Timestamp used for final ordering: a versioned turn sorts by its first
    /// version.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            TranscriptItem::Single(m) => m.timestamp.as_deref(),
            TranscriptItem::Versioned(v) => v.head.timestamp.as_deref(),
        }
    }

    pub fn role(&self) -> &str {
        match self {
            TranscriptItem::Single(m) => &m.role,
            TranscriptItem::Versioned(v) => &v.head.role,
        }
    }
}
