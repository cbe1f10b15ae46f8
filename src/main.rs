use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use claude_lens::analyzer::{ReportOptions, UsageAnalyzer};
use claude_lens::config::get_config;
use claude_lens::logging::init_logging;
use claude_lens::pricing::PriceTable;

#[derive(Parser)]
#[command(name = "claude-lens")]
#[command(about = "Cost analytics and transcripts for Claude-compatible CLI session logs")]
#[command(version)]
struct Cli {
    /// Projects directory to scan (defaults to ~/.claude/projects)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show aggregated totals with model/date/project breakdowns
    Stats {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
    },
    /// List sessions, most recently active first
    Sessions {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Show at most N sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Reconstruct one session's transcript
    Transcript {
        /// Session id to reconstruct
        session_id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging();
    let cli = Cli::parse();
    let analyzer = build_analyzer(cli.root);

    match cli.command.unwrap_or(Commands::Stats {
        json: false,
        since: None,
        until: None,
    }) {
        Commands::Stats { json, since, until } => {
            let options = ReportOptions {
                json_output: json,
                limit: None,
                since_date: parse_date_arg(since.as_deref(), "since", false, json),
                until_date: parse_date_arg(until.as_deref(), "until", true, json),
            };
            match analyzer.run_stats(options).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
        Commands::Sessions { json, limit } => {
            let options = ReportOptions {
                json_output: json,
                limit,
                since_date: None,
                until_date: None,
            };
            match analyzer.run_sessions(options).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
        Commands::Transcript { session_id, json } => {
            let options = ReportOptions {
                json_output: json,
                ..Default::default()
            };
            match analyzer.run_transcript(&session_id, options).await {
                Ok(()) => Ok(()),
                Err(e) => handle_error(e, json),
            }
        }
    }
}

fn build_analyzer(root: Option<PathBuf>) -> UsageAnalyzer {
    let config = get_config();
    let projects_dir = root.unwrap_or_else(|| config.projects_dir());
    UsageAnalyzer::with_parts(PriceTable::builtin(), projects_dir, config.scan.batch_size)
}

/// Parse a --since/--until argument into a UTC day boundary. Exits non-zero
/// on a malformed date instead of silently scanning everything.
fn parse_date_arg(
    value: Option<&str>,
    name: &str,
    end_of_day: bool,
    json: bool,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let raw = value?;
    match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => {
            let (h, m, s) = if end_of_day { (23, 59, 59) } else { (0, 0, 0) };
            date.and_hms_opt(h, m, s).map(|dt| dt.and_utc())
        }
        Err(_) => {
            if !json {
                eprintln!("❌ Invalid {} date format: {}. Use YYYY-MM-DD", name, raw);
            }
            process::exit(1);
        }
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": e.to_string() }));
    } else {
        eprintln!("Error: {}", e);
    }
    process::exit(1);
}
