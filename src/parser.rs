//! Log Record Parsing
//!
//! Turns raw JSONL lines into typed records. Each line is classified exactly
//! once into a [`LogRecord`]: usage-bearing (counts toward statistics), plain
//! message (visible to transcripts only), or unrecognized (skipped). A
//! JSON-syntax error on a line is never fatal - the line is skipped with a
//! debug diagnostic and parsing continues.
//!
//! Within a single file-parse pass, usage entries are deduplicated by
//! `message.id`: the tool re-emits lines on retry, and a second line with an
//! already-seen id must not count twice. Entries without an id are never
//! deduplicated against each other here.

use crate::models::{LogRecord, MessageRecord, RawRecord, TokenUsage, UsageEntry};
use crate::pricing::PriceTable;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

pub struct LogRecordParser<'a> {
    prices: &'a PriceTable,
}

impl<'a> LogRecordParser<'a> {
    pub fn new(prices: &'a PriceTable) -> Self {
        Self { prices }
    }

    /// Classify one JSONL line. Resolves the record's shape once so consumers
    /// never re-check field presence.
    pub fn classify_line(&self, line: &str) -> LogRecord {
        let line = line.trim();
        if line.is_empty() {
            return LogRecord::Unrecognized;
        }

        let raw: RawRecord = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(error = %err, "skipping malformed log line");
                return LogRecord::Unrecognized;
            }
        };

        let has_message = raw.message.is_some();
        if !has_message && raw.record_type.is_none() {
            return LogRecord::Unrecognized;
        }

        let message = raw.message;
        let usage = message
            .as_ref()
            .and_then(|m| m.usage.as_ref())
            .map(TokenUsage::from_raw);

        let record = MessageRecord {
            session_id: raw
                .session_id
                .unwrap_or_else(|| "unknown".to_string()),
            timestamp: raw.timestamp,
            record_type: raw.record_type,
            message_id: message.as_ref().and_then(|m| m.id.clone()),
            role: message.as_ref().and_then(|m| m.role.clone()),
            model: message.as_ref().and_then(|m| m.model.clone()),
            content: normalize_content(message.and_then(|m| m.content)),
            usage,
        };

        match record.usage {
            Some(usage) if !usage.is_zero() => LogRecord::UsageBearing(Box::new(record)),
            _ => LogRecord::PlainMessage(Box::new(record)),
        }
    }

    /// Parse a whole file's contents into usage entries, deduplicating by
    /// `message.id` within this pass.
    pub fn parse_file(&self, contents: &str, project_path: &str) -> Vec<UsageEntry> {
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();

        for line in contents.lines() {
            let LogRecord::UsageBearing(record) = self.classify_line(line) else {
                continue;
            };

            if let Some(id) = &record.message_id {
                if !seen_ids.insert(id.clone()) {
                    debug!(message_id = %id, "skipping duplicate usage entry");
                    continue;
                }
            }

            entries.push(self.to_usage_entry(&record, project_path));
        }

        entries
    }

    /// Parse a whole file's contents into message records for one session,
    /// keeping plain messages as well as usage-bearing ones. Transcript-level
    /// deduplication happens downstream, where synthetic ids exist.
    pub fn session_records(&self, contents: &str, session_id: &str) -> Vec<MessageRecord> {
        contents
            .lines()
            .filter_map(|line| match self.classify_line(line) {
                LogRecord::UsageBearing(r) | LogRecord::PlainMessage(r) => Some(*r),
                LogRecord::Unrecognized => None,
            })
            .filter(|r| r.session_id == session_id)
            .collect()
    }

    fn to_usage_entry(&self, record: &MessageRecord, project_path: &str) -> UsageEntry {
        let model = record
            .model
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let usage = record.usage.unwrap_or_default();
        UsageEntry {
            timestamp: record.timestamp.clone(),
            cost: self.prices.cost_of(&usage, &model),
            model,
            usage,
            session_id: record.session_id.clone(),
            project_path: project_path.to_string(),
            message_id: record.message_id.clone(),
        }
    }
}

/// Content arrives as an array of blocks, a bare string, or nothing.
/// Normalize to an ordered block sequence.
fn normalize_content(content: Option<Value>) -> Vec<Value> {
    match content {
        Some(Value::Array(blocks)) => blocks,
        Some(Value::String(text)) => {
            vec![serde_json::json!({"type": "text", "text": text})]
        }
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_fixture() -> PriceTable {
        PriceTable::builtin()
    }

    fn usage_line(id: &str, input: u64) -> String {
        format!(
            r#"{{"sessionId":"s1","timestamp":"2024-05-01T10:00:00Z","type":"assistant","message":{{"id":"{}","role":"assistant","model":"claude-sonnet-4","usage":{{"input_tokens":{},"output_tokens":5,"cache_creation_input_tokens":0,"cache_read_input_tokens":0}},"content":[{{"type":"text","text":"hi"}}]}}}}"#,
            id, input
        )
    }

    #[test]
    fn test_blank_and_malformed_lines_are_unrecognized() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        assert!(matches!(parser.classify_line(""), LogRecord::Unrecognized));
        assert!(matches!(
            parser.classify_line("not json at all"),
            LogRecord::Unrecognized
        ));
        assert!(matches!(
            parser.classify_line(r#"{"unrelated": true}"#),
            LogRecord::Unrecognized
        ));
    }

    #[test]
    fn test_all_zero_usage_is_plain_message() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let line = r#"{"sessionId":"s1","type":"assistant","message":{"role":"assistant","usage":{"input_tokens":0,"output_tokens":0,"cache_creation_input_tokens":0,"cache_read_input_tokens":0}}}"#;
        assert!(matches!(
            parser.classify_line(line),
            LogRecord::PlainMessage(_)
        ));
    }

    #[test]
    fn test_missing_usage_is_plain_message() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let line = r#"{"sessionId":"s1","type":"user","message":{"role":"user","content":"hello"}}"#;
        assert!(matches!(
            parser.classify_line(line),
            LogRecord::PlainMessage(_)
        ));
    }

    #[test]
    fn test_parse_file_dedups_by_message_id() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let contents = format!("{}\n{}\n", usage_line("msg1", 100), usage_line("msg1", 100));
        let entries = parser.parse_file(&contents, "proj");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].usage.input_tokens, 100);
    }

    #[test]
    fn test_parse_file_keeps_idless_entries() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let line = r#"{"sessionId":"s1","message":{"role":"assistant","model":"claude-sonnet-4","usage":{"input_tokens":10,"output_tokens":1,"cache_creation_input_tokens":0,"cache_read_input_tokens":0}}}"#;
        let contents = format!("{}\n{}\n", line, line);
        let entries = parser.parse_file(&contents, "proj");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_parse_file_skips_bad_lines_and_continues() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let contents = format!("{{broken\n\n{}\n", usage_line("msg2", 42));
        let entries = parser.parse_file(&contents, "proj");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message_id.as_deref(), Some("msg2"));
    }

    #[test]
    fn test_entry_cost_and_defaults() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let line = r#"{"message":{"usage":{"input_tokens":1000000}}}"#;
        let entries = parser.parse_file(line, "proj");
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.model, "unknown");
        assert_eq!(entry.session_id, "unknown");
        assert_eq!(entry.cost, 0.0);
    }

    #[test]
    fn test_session_records_filters_and_keeps_plain() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let contents = format!(
            "{}\n{}\n{}\n",
            r#"{"sessionId":"s1","type":"user","message":{"role":"user","content":"hello"}}"#,
            usage_line("msg1", 10),
            r#"{"sessionId":"other","type":"user","message":{"role":"user","content":"elsewhere"}}"#,
        );
        let records = parser.session_records(&contents, "s1");
        assert_eq!(records.len(), 2);
        assert!(records[0].usage.is_none());
        assert!(records[1].usage.is_some());
    }

    #[test]
    fn test_string_content_normalized_to_text_block() {
        let prices = parser_fixture();
        let parser = LogRecordParser::new(&prices);
        let line = r#"{"sessionId":"s1","message":{"role":"user","content":"plain words"}}"#;
        let LogRecord::PlainMessage(record) = parser.classify_line(line) else {
            panic!("expected plain message");
        };
        assert_eq!(record.content.len(), 1);
        assert_eq!(record.content[0]["type"], "text");
        assert_eq!(record.content[0]["text"], "plain words");
    }
}
