// Not every test binary uses every helper.
#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a projects root with one project directory.
pub fn project_dir(root: &TempDir, project: &str) -> Result<PathBuf> {
    let dir = root.path().join(project);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

pub fn write_jsonl(dir: &Path, filename: &str, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(dir.join(filename), content)?;
    Ok(())
}

/// A usage-bearing assistant record.
pub fn usage_line(
    session: &str,
    message_id: &str,
    timestamp: &str,
    model: &str,
    input: i64,
    output: i64,
) -> String {
    format!(
        r#"{{"sessionId":"{session}","timestamp":"{timestamp}","type":"assistant","message":{{"id":"{message_id}","role":"assistant","model":"{model}","usage":{{"input_tokens":{input},"output_tokens":{output},"cache_creation_input_tokens":0,"cache_read_input_tokens":0}},"content":[{{"type":"text","text":"reply"}}]}}}}"#
    )
}

/// A plain message record with no usage object.
pub fn message_line(session: &str, timestamp: &str, role: &str, text: &str) -> String {
    format!(
        r#"{{"sessionId":"{session}","timestamp":"{timestamp}","type":"{role}","message":{{"role":"{role}","content":[{{"type":"text","text":"{text}"}}]}}}}"#
    )
}
