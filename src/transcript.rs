//! Session Transcript Reconstruction
//!
//! Rebuilds an ordered conversation from the raw records of one session.
//! Unlike the stats pipeline, the transcript keeps plain turns that carry no
//! token usage - a conversation is more than its billable lines.
//!
//! The source tool re-emits an edited or regenerated turn as a new log line
//! sharing the original's approximate timestamp and role. Without grouping,
//! a viewer would show duplicate turns instead of an edit history, so
//! messages sharing a (second-resolution timestamp, role) key with distinct
//! content are folded into a single [`VersionedMessage`].
//!
//! Content identity uses a rolling hash as a cheap first pass, but two
//! versions are only ever collapsed when their serialized content is
//! byte-identical - hash equality alone never merges.

use crate::models::{MessageRecord, TranscriptItem, TranscriptMessage, VersionedMessage};
use crate::timestamp_parser::TimestampParser;
use std::collections::{HashMap, HashSet};

/// Grouping key for version detection. Records with unparsable timestamps
/// get a key of their own so they can never be falsely merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    At(i64, String),
    Solo(String),
}

pub struct TranscriptBuilder;

impl TranscriptBuilder {
    /// Build the ordered transcript from one session's raw records.
    pub fn build(records: Vec<MessageRecord>) -> Vec<TranscriptItem> {
        let mut messages: Vec<TranscriptMessage> =
            records.into_iter().map(resolve_message).collect();

        // Dedup by real or synthesized id; first occurrence wins.
        let mut seen: HashSet<String> = HashSet::new();
        messages.retain(|m| seen.insert(m.id.clone()));

        sort_messages(&mut messages);

        let mut items = group_versions(messages);

        items.sort_by(|a, b| {
            order_key(a.timestamp())
                .cmp(&order_key(b.timestamp()))
                .then_with(|| role_rank(a.role()).cmp(&role_rank(b.role())))
        });

        items
    }
}

/// Resolve identity and role for one raw record.
fn resolve_message(record: MessageRecord) -> TranscriptMessage {
    let id = record
        .message_id
        .clone()
        .unwrap_or_else(|| synthesize_id(&record));

    let base_role = record
        .role
        .clone()
        .or_else(|| record.record_type.clone())
        .unwrap_or_else(|| "unknown".to_string());

    // A user-typed record whose content carries a tool_result block is the
    // tool's answer, not something the human typed.
    let is_tool_result = record.record_type.as_deref() == Some("user")
        && record
            .content
            .iter()
            .any(|block| block.get("type").and_then(|t| t.as_str()) == Some("tool_result"));

    let (role, original_role) = if is_tool_result && base_role != "tool_result" {
        ("tool_result".to_string(), Some(base_role))
    } else {
        (base_role, None)
    };

    TranscriptMessage {
        id,
        timestamp: record.timestamp,
        session_id: record.session_id,
        role,
        content: record.content,
        model: record.model,
        usage: record.usage,
        record_type: record.record_type,
        original_role,
    }
}

/// Identity for records the tool logged without a message id: type, timestamp
/// and a content prefix keep distinct turns apart even when they share a
/// timestamp.
fn synthesize_id(record: &MessageRecord) -> String {
    let serialized = serde_json::to_string(&record.content).unwrap_or_default();
    let prefix: String = serialized.chars().take(20).collect();
    format!(
        "{}_{}_{}",
        record.record_type.as_deref().unwrap_or("message"),
        record.timestamp.as_deref().unwrap_or("unknown"),
        prefix
    )
}

fn sort_messages(messages: &mut [TranscriptMessage]) {
    messages.sort_by(|a, b| {
        order_key(a.timestamp.as_deref())
            .cmp(&order_key(b.timestamp.as_deref()))
            .then_with(|| role_rank(&a.role).cmp(&role_rank(&b.role)))
    });
}

/// Parsed ordering key; unparsable timestamps sort first, then by raw string
/// so the order stays stable across runs.
fn order_key(timestamp: Option<&str>) -> (Option<i64>, String) {
    let parsed = timestamp
        .and_then(|ts| TimestampParser::parse(ts).ok())
        .map(|dt| dt.timestamp_millis());
    (parsed, timestamp.unwrap_or_default().to_string())
}

/// On an exact timestamp tie the user's turn comes before the reply.
fn role_rank(role: &str) -> u8 {
    match role {
        "user" => 0,
        "tool_result" => 1,
        "assistant" => 2,
        _ => 3,
    }
}

/// Bucket by (timestamp floored to the second, role) and collapse identical
/// re-emissions; what remains in a bucket is the turn's edit history.
fn group_versions(messages: Vec<TranscriptMessage>) -> Vec<TranscriptItem> {
    let mut order: Vec<(GroupKey, Vec<TranscriptMessage>)> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for message in messages {
        let key = match TimestampParser::epoch_second(message.timestamp.as_deref()) {
            Some(secs) => GroupKey::At(secs, message.role.clone()),
            None => GroupKey::Solo(message.id.clone()),
        };
        match index.get(&key) {
            Some(&slot) => order[slot].1.push(message),
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, vec![message]));
            }
        }
    }

    order
        .into_iter()
        .map(|(_, bucket)| collapse_bucket(bucket))
        .collect()
}

fn collapse_bucket(bucket: Vec<TranscriptMessage>) -> TranscriptItem {
    // (hash, serialized content) for each kept version. The hash narrows the
    // comparison; byte equality decides it.
    let mut kept: Vec<TranscriptMessage> = Vec::new();
    let mut signatures: Vec<(u64, String)> = Vec::new();

    for message in bucket {
        let serialized = serde_json::to_string(&message.content).unwrap_or_default();
        let hash = content_hash(&serialized);
        let duplicate = signatures
            .iter()
            .any(|(h, s)| *h == hash && *s == serialized);
        if !duplicate {
            signatures.push((hash, serialized));
            kept.push(message);
        }
    }

    if kept.len() == 1 {
        TranscriptItem::Single(kept.remove(0))
    } else {
        let total_versions = kept.len();
        TranscriptItem::Versioned(VersionedMessage {
            head: kept[0].clone(),
            is_versioned: true,
            versions: kept,
            current_version: 0,
            total_versions,
        })
    }
}

/// djb2-style rolling hash over the serialized content. A heuristic only -
/// see the exact-equality guard in [`collapse_bucket`].
fn content_hash(serialized: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in serialized.bytes() {
        hash = hash.wrapping_mul(33) ^ u64::from(byte);
    }
    hash
}
