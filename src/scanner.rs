//! Log Tree Scanning
//!
//! Recursive discovery of `*.jsonl` session logs under a projects root laid
//! out as `<root>/<project-segment>/<...nested...>/<file>.jsonl`. The walk
//! uses an explicit work stack rather than language-level recursion so stack
//! depth stays bounded on pathological trees, and tracks visited canonical
//! paths so symlink cycles terminate.
//!
//! Directory entries are handled in fixed-size batches with a cooperative
//! yield between batches, keeping a host event loop responsive during long
//! scans. Traversal order carries no meaning - every ordering guarantee is
//! established downstream by the aggregation and transcript layers.
//!
//! Failure handling is strictly best-effort: a missing root is "no data", an
//! unreadable directory or file is skipped with a debug diagnostic, and the
//! scan continues with whatever remains.

use crate::models::{MessageRecord, UsageEntry};
use crate::parser::LogRecordParser;
use crate::pricing::PriceTable;
use futures::future::join_all;
use percent_encoding::percent_decode_str;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory entries handled between cooperative yields.
pub const DEFAULT_SCAN_BATCH: usize = 10;

pub struct LogTreeScanner<'a> {
    parser: LogRecordParser<'a>,
    batch_size: usize,
}

impl<'a> LogTreeScanner<'a> {
    pub fn new(prices: &'a PriceTable) -> Self {
        Self {
            parser: LogRecordParser::new(prices),
            batch_size: DEFAULT_SCAN_BATCH,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Scan the whole tree into usage entries. Missing root yields an empty
    /// collection, never an error.
    pub async fn scan_usage(&self, root: &Path) -> Vec<UsageEntry> {
        let files = self.collect_files(root).await;
        let mut entries = Vec::new();
        self.read_in_batches(&files, |contents, project| {
            entries.extend(self.parser.parse_file(contents, project));
        })
        .await;
        entries
    }

    /// Re-scan the tree for one session, keeping plain messages as well as
    /// usage-bearing records. Independent of any prior usage scan.
    pub async fn scan_session(&self, root: &Path, session_id: &str) -> Vec<MessageRecord> {
        let files = self.collect_files(root).await;
        let mut records = Vec::new();
        self.read_in_batches(&files, |contents, _project| {
            records.extend(self.parser.session_records(contents, session_id));
        })
        .await;
        records
    }

    /// Read files in fixed-size batches, feeding each readable file's
    /// contents to the sink. Unreadable files are skipped.
    async fn read_in_batches<F>(&self, files: &[(PathBuf, String)], mut sink: F)
    where
        F: FnMut(&str, &str),
    {
        for batch in files.chunks(self.batch_size) {
            let reads =
                join_all(batch.iter().map(|(path, _)| tokio::fs::read_to_string(path))).await;
            for ((path, project), contents) in batch.iter().zip(reads) {
                match contents {
                    Ok(contents) => sink(&contents, project),
                    Err(err) => {
                        debug!(file = %path.display(), error = %err, "skipping unreadable log file");
                    }
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Walk the tree, returning every `.jsonl` file with its decoded project
    /// segment. Files sitting directly in the root have no derivable project.
    async fn collect_files(&self, root: &Path) -> Vec<(PathBuf, String)> {
        let root_canonical = match tokio::fs::canonicalize(root).await {
            Ok(path) => path,
            Err(err) => {
                debug!(root = %root.display(), error = %err, "projects root not readable, treating as empty");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(root_canonical);

        // Work stack of (directory, project segment). Children of the root
        // establish the segment; deeper levels inherit it.
        let mut stack: Vec<(PathBuf, Option<String>)> = vec![(root.to_path_buf(), None)];

        while let Some((dir, project)) = stack.pop() {
            let mut read_dir = match tokio::fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                    continue;
                }
            };

            let mut dirents = Vec::new();
            loop {
                match read_dir.next_entry().await {
                    Ok(Some(entry)) => dirents.push(entry),
                    Ok(None) => break,
                    Err(err) => {
                        debug!(dir = %dir.display(), error = %err, "directory listing truncated");
                        break;
                    }
                }
            }

            for batch in dirents.chunks(self.batch_size) {
                for dirent in batch {
                    let path = dirent.path();
                    let file_type = match dirent.file_type().await {
                        Ok(ft) => ft,
                        Err(err) => {
                            debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                            continue;
                        }
                    };

                    let segment = path
                        .file_name()
                        .map(|n| decode_project_segment(&n.to_string_lossy()));

                    if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                        // Resolve through symlinks so a cycle revisits a
                        // canonical path we have already queued.
                        let canonical = match tokio::fs::canonicalize(&path).await {
                            Ok(c) => c,
                            Err(err) => {
                                debug!(path = %path.display(), error = %err, "skipping unresolvable directory");
                                continue;
                            }
                        };
                        if !visited.insert(canonical) {
                            debug!(path = %path.display(), "skipping already-visited directory");
                            continue;
                        }
                        let next_project = project.clone().or(segment);
                        stack.push((path, next_project));
                    } else if path.extension().is_some_and(|ext| ext == "jsonl") {
                        let project_name = project
                            .clone()
                            .unwrap_or_else(|| "Unknown Project".to_string());
                        files.push((path, project_name));
                    }
                }
                tokio::task::yield_now().await;
            }
        }

        files
    }
}

/// Project directories are percent-encoded by the log producer. Decode for
/// display, falling back to the raw segment when the encoding is broken.
fn decode_project_segment(segment: &str) -> String {
    match percent_decode_str(segment).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}
