//! Output Formatting
//!
//! Terminal and JSON rendering for the three reports. Human output uses
//! colored summaries; `--json` pretty-prints the serde structures unchanged,
//! so scripted consumers see exactly the documented camelCase shapes.

use crate::models::{AggregatedStats, SessionDetail, TranscriptItem, TranscriptMessage};
use anyhow::{Context, Result};
use colored::Colorize;

const SEPARATOR_WIDTH: usize = 80;
const PREVIEW_CHARS: usize = 120;

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    pub fn display_stats(&self, stats: &AggregatedStats, json_output: bool) -> Result<()> {
        if json_output {
            let json_str =
                serde_json::to_string_pretty(stats).context("Failed to serialize stats")?;
            println!("{}", json_str);
            return Ok(());
        }

        self.header("Usage Report - Totals and Breakdowns");

        println!(
            "\n{} {} sessions • {} tokens • {} total\n",
            "📊".bright_yellow(),
            stats.session_count.to_string().bright_white().bold(),
            format_tokens(stats.total_tokens).bright_white().bold(),
            format!("${:.2}", stats.total_cost).bright_green().bold()
        );
        println!(
            "   input {} • output {} • cache write {} • cache read {}\n",
            format_tokens(stats.tokens.input_tokens).bright_white(),
            format_tokens(stats.tokens.output_tokens).bright_white(),
            format_tokens(stats.tokens.cache_creation_tokens).bright_white(),
            format_tokens(stats.tokens.cache_read_tokens).bright_white(),
        );

        if !stats.by_model.is_empty() {
            println!("{} By model:", "🤖".bright_blue());
            for row in &stats.by_model {
                println!(
                    "   {}: {} ({} tokens, {} sessions)",
                    row.model.bright_cyan(),
                    format!("${:.2}", row.totals.total_cost).bright_green(),
                    format_tokens(row.totals.total_tokens).bright_white(),
                    row.totals.session_count.to_string().bright_white()
                );
            }
            println!();
        }

        if !stats.by_date.is_empty() {
            println!("{} By date:", "📅".bright_blue());
            for row in &stats.by_date {
                println!(
                    "   {}: {} ({} tokens)",
                    row.date.bright_white().bold(),
                    format!("${:.2}", row.totals.total_cost).bright_green(),
                    format_tokens(row.totals.total_tokens).bright_white()
                );
            }
            println!();
        }

        if !stats.by_project.is_empty() {
            println!("{} By project:", "📁".bright_blue());
            for row in &stats.by_project {
                let percentage = if stats.total_cost > 0.0 {
                    row.totals.total_cost / stats.total_cost * 100.0
                } else {
                    0.0
                };
                println!(
                    "   {}: {} ({}%, {} sessions)",
                    row.project_path.bright_cyan(),
                    format!("${:.2}", row.totals.total_cost).bright_green(),
                    format!("{:.0}", percentage).bright_yellow(),
                    row.totals.session_count.to_string().bright_white()
                );
            }
        }

        Ok(())
    }

    pub fn display_sessions(&self, sessions: &[SessionDetail], json_output: bool) -> Result<()> {
        if json_output {
            let json_str =
                serde_json::to_string_pretty(sessions).context("Failed to serialize sessions")?;
            println!("{}", json_str);
            return Ok(());
        }

        self.header("Usage Report - Sessions (most recent first)");
        println!();

        if sessions.is_empty() {
            println!("No session data found.");
            return Ok(());
        }

        for session in sessions {
            println!(
                "{} {} — {} ({} messages, {} tokens)",
                "🗂".bright_blue(),
                session.session_id.bright_white().bold(),
                format!("${:.2}", session.total_cost).bright_green().bold(),
                session.message_count.to_string().bright_white(),
                format_tokens(session.total_tokens).bright_white()
            );
            println!(
                "   {} • {} → {} • {}",
                session.project_path.bright_cyan(),
                session.first_timestamp.as_deref().unwrap_or("unknown"),
                session.last_timestamp.as_deref().unwrap_or("unknown"),
                session.models_used.join(", ").bright_yellow()
            );
            println!();
        }

        Ok(())
    }

    pub fn display_transcript(
        &self,
        session_id: &str,
        items: &[TranscriptItem],
        json_output: bool,
    ) -> Result<()> {
        if json_output {
            let json_str =
                serde_json::to_string_pretty(items).context("Failed to serialize transcript")?;
            println!("{}", json_str);
            return Ok(());
        }

        self.header(&format!("Transcript - session {}", session_id));
        println!();

        if items.is_empty() {
            println!("No messages found for this session.");
            return Ok(());
        }

        for item in items {
            match item {
                TranscriptItem::Single(message) => self.print_message(message, None),
                TranscriptItem::Versioned(versioned) => {
                    self.print_message(&versioned.head, Some(versioned.total_versions));
                    for (index, version) in versioned.versions.iter().enumerate().skip(1) {
                        println!(
                            "      {} {}",
                            format!("v{}:", index + 1).bright_yellow(),
                            content_preview(version)
                        );
                    }
                }
            }
        }

        Ok(())
    }

    fn print_message(&self, message: &TranscriptMessage, versions: Option<usize>) {
        let role = match message.role.as_str() {
            "user" => message.role.bright_cyan().bold(),
            "assistant" => message.role.bright_green().bold(),
            _ => message.role.bright_yellow().bold(),
        };
        let version_marker = versions
            .map(|count| format!(" ({} versions)", count))
            .unwrap_or_default();
        println!(
            "[{}] {}{}",
            message.timestamp.as_deref().unwrap_or("unknown").dimmed(),
            role,
            version_marker.bright_yellow()
        );
        println!("      {}", content_preview(message));
    }

    fn header(&self, title: &str) {
        println!("\n{}", "=".repeat(SEPARATOR_WIDTH).bright_cyan());
        println!("{}", title.bright_white().bold());
        println!("{}", "=".repeat(SEPARATOR_WIDTH).bright_cyan());
    }
}

fn format_tokens(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}k", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// One-line preview of a message: concatenated text blocks, block-type tags
/// for everything else.
fn content_preview(message: &TranscriptMessage) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in &message.content {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
                    parts.push(text.to_string());
                }
            }
            Some(other) => parts.push(format!("[{}]", other)),
            None => parts.push("[block]".to_string()),
        }
    }
    let joined = parts.join(" ");
    let preview: String = joined.chars().take(PREVIEW_CHARS).collect();
    if preview.len() < joined.len() {
        format!("{}…", preview)
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(950), "950");
        assert_eq!(format_tokens(1_500), "1.5k");
        assert_eq!(format_tokens(2_500_000), "2.5M");
    }

    #[test]
    fn test_content_preview_mixes_text_and_tags() {
        let message = TranscriptMessage {
            id: "m".to_string(),
            timestamp: None,
            session_id: "s".to_string(),
            role: "assistant".to_string(),
            content: vec![
                json!({"type": "text", "text": "hello"}),
                json!({"type": "tool_use", "name": "read"}),
            ],
            model: None,
            usage: None,
            record_type: None,
            original_role: None,
        };
        assert_eq!(content_preview(&message), "hello [tool_use]");
    }
}
