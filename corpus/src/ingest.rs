//! Read crawled log dumps into normalized messages.
//!
//! Each input line is one day document, `{"data": [record, ...]}`. Any line or
//! record that does not parse aborts the whole read: the archive is expected to
//! be well formed, so a failure here means the format changed upstream.

use crate::normalize::Normalizer;
use anyhow::{Context, Result};
use replypack_types::{LogDay, Message};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub lines: usize,
    pub records: usize,
}

/// Read a single log file or every `*.jsonl` / `*.json` file under a directory.
pub fn read_log_path(path: &Path) -> Result<(Vec<Message>, IngestStats)> {
    let mut stats = IngestStats::default();
    let mut messages = Vec::new();
    let normalizer = Normalizer::new();

    for file in log_files(path)? {
        read_log_file_into(&file, &normalizer, &mut messages, &mut stats)?;
    }
    Ok((messages, stats))
}

pub fn read_log_file(path: &Path) -> Result<Vec<Message>> {
    let mut stats = IngestStats::default();
    let mut messages = Vec::new();
    read_log_file_into(path, &Normalizer::new(), &mut messages, &mut stats)?;
    Ok(messages)
}

fn log_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta =
        std::fs::metadata(path).with_context(|| format!("stat log input {}", path.display()))?;
    if !meta.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.with_context(|| format!("walk log dir {}", path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matches!(
            entry.path().extension().and_then(|s| s.to_str()),
            Some("jsonl" | "json")
        ) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn read_log_file_into(
    path: &Path,
    normalizer: &Normalizer,
    out: &mut Vec<Message>,
    stats: &mut IngestStats,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("open log file {}", path.display()))?;
    let reader = BufReader::new(file);
    let before = out.len();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("read {}:{line_no}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        stats.lines += 1;

        let day: LogDay = serde_json::from_str(&line)
            .with_context(|| format!("parse day document at {}:{line_no}", path.display()))?;
        for record in &day.data {
            let message = normalizer
                .normalize(record)
                .with_context(|| format!("normalize record at {}:{line_no}", path.display()))?;
            out.push(message);
        }
        stats.records += day.data.len();
    }

    stats.files += 1;
    debug!(path = %path.display(), messages = out.len() - before, "read log file");
    Ok(())
}
