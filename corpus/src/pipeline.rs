//! End-to-end run: ingest, filter, resolve, enumerate, assemble, shuffle, write.
//!
//! Each stage consumes its whole input before the next starts.

use crate::assemble::{assemble_samples, shuffle_samples, TextProcessor};
use crate::config::{PackConfig, PipelineConfig};
use crate::filter::{filter_messages, FilterStats};
use crate::ingest::{read_log_path, IngestStats};
use crate::links::resolve_links;
use crate::pack_writer::write_packs;
use crate::windows::{build_windows, Window};
use anyhow::{Context, Result};
use replypack_types::Message;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    pub ingest: IngestStats,
    pub filter: FilterStats,
    pub dangling_refs: usize,
    pub windows: usize,
    pub packs: usize,
}

/// Filtered, link-resolved messages plus the windows over them.
#[derive(Debug, Default)]
pub struct PreparedCorpus {
    pub messages: Vec<Message>,
    pub windows: Vec<Window>,
    pub stats: PipelineStats,
}

/// The in-memory part of the pipeline, no I/O.
pub fn prepare_messages(messages: Vec<Message>, config: &PipelineConfig) -> PreparedCorpus {
    let (mut messages, filter) = filter_messages(messages, config);
    info!(
        kept = filter.kept,
        flood = filter.flood,
        too_long = filter.too_long,
        links = filter.links,
        wrong_script = filter.wrong_script,
        "filtered messages"
    );

    let dangling_refs = resolve_links(&mut messages);
    info!(dropped = dangling_refs, "resolved reply links");

    let windows = build_windows(&messages, config);
    info!(
        windows = windows.len(),
        mode = %config.window_mode,
        context_len = config.context_len,
        "enumerated context windows"
    );
    if windows.is_empty() {
        warn!("no context windows produced");
    }

    PreparedCorpus {
        stats: PipelineStats {
            filter,
            dangling_refs,
            windows: windows.len(),
            ..Default::default()
        },
        messages,
        windows,
    }
}

/// Read `input` and run every stage up to enumeration.
pub fn prepare(input: &Path, config: &PipelineConfig) -> Result<PreparedCorpus> {
    config.validate()?;
    let (messages, ingest) = read_log_path(input)
        .with_context(|| format!("read logs from {}", input.display()))?;
    info!(
        files = ingest.files,
        lines = ingest.lines,
        records = ingest.records,
        "ingested logs"
    );

    let mut prepared = prepare_messages(messages, config);
    prepared.stats.ingest = ingest;
    Ok(prepared)
}

pub fn run_pipeline(config: &PackConfig, processor: &dyn TextProcessor) -> Result<PipelineStats> {
    let prepared = prepare(&config.input, &config.pipeline)?;

    let mut samples = assemble_samples(&prepared.messages, &prepared.windows, processor);
    shuffle_samples(&mut samples, config.pipeline.shuffle_seed);

    let packs = write_packs(&samples, &config.output_dir, config.pipeline.batch_size)?;
    info!(
        packs = packs.packs,
        samples = packs.samples,
        dir = %config.output_dir.display(),
        "wrote packs"
    );

    let mut stats = prepared.stats;
    stats.packs = packs.packs;
    Ok(stats)
}
