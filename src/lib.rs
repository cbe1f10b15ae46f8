//! Claude Lens
//!
//! Cost analytics and transcript reconstruction over the JSONL session logs
//! written by Claude-compatible CLI tools. The library scans a projects
//! directory tree, parses heterogeneous and partially-malformed records,
//! prices token usage against a versioned in-memory table, and produces
//! multi-dimensional rollups plus ordered, de-duplicated conversation
//! transcripts with edit-history grouping.
//!
//! ## Architecture
//!
//! - [`models`] - serde data model from raw records to report rows
//! - [`pricing`] - per-model price table with fuzzy/family fallback
//! - [`parser`] - per-line classification and usage-entry construction
//! - [`scanner`] - explicit-stack async walk over the log tree
//! - [`aggregator`] - totals and byModel/byDate/byProject/session rollups
//! - [`transcript`] - session transcript reconstruction and version grouping
//! - [`analyzer`] - orchestration of scan → aggregate / transcript
//! - [`display`] - colored terminal and JSON report rendering
//! - [`config`] - file + environment configuration for the CLI layer
//! - [`logging`] - tracing setup (console/file, json/pretty)
//!
//! ## Entry Point
//!
//! ```rust,no_run
//! use claude_lens::{ReportOptions, UsageAnalyzer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = UsageAnalyzer::new();
//! let stats = analyzer.stats(&ReportOptions::default()).await;
//! println!("total: ${:.2}", stats.total_cost);
//! # Ok(())
//! # }
//! ```
//!
//! The engine has no fatal error class: missing directories yield empty
//! results, malformed lines and unreadable files are skipped with debug
//! diagnostics, and unknown models price at zero rather than guessing.

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod display;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pricing;
pub mod scanner;
pub mod timestamp_parser;
pub mod transcript;

pub use analyzer::{ReportOptions, UsageAnalyzer};
pub use models::*;
pub use pricing::PriceTable;
