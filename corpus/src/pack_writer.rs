use anyhow::{ensure, Context, Result};
use replypack_types::Sample;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const PACK_PREFIX: &str = "pack_";

#[derive(Debug, Default, Clone)]
pub struct PackStats {
    pub packs: usize,
    pub samples: usize,
    pub paths: Vec<PathBuf>,
}

pub fn pack_path(dir: &Path, number: usize) -> PathBuf {
    dir.join(format!("{PACK_PREFIX}{number}"))
}

/// Write `samples` as `pack_0`, `pack_1`, ... each a JSON array of at most
/// `batch_size` samples. Nothing is written for an empty input.
pub fn write_packs(samples: &[Sample], dir: &Path, batch_size: usize) -> Result<PackStats> {
    ensure!(batch_size > 0, "batch_size must be at least 1");
    fs::create_dir_all(dir).with_context(|| format!("create pack dir {}", dir.display()))?;

    let mut stats = PackStats::default();
    for (number, batch) in samples.chunks(batch_size).enumerate() {
        let path = pack_path(dir, number);
        write_pack(&path, batch)?;
        debug!(path = %path.display(), samples = batch.len(), "wrote pack");
        stats.packs += 1;
        stats.samples += batch.len();
        stats.paths.push(path);
    }
    Ok(stats)
}

fn write_pack(path: &Path, batch: &[Sample]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create pack {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, batch)
        .with_context(|| format!("serialize pack {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush pack {}", path.display()))?;
    Ok(())
}
