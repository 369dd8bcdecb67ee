//! Relocates every world of a packed layout tree into one output store.
//!
//! One task per world runs on a fixed-size pool, which bounds how many source
//! stores and staged batches are alive at once. A world's payload is
//! committed in a single batch after all its chunks are staged, and its
//! rewritten records are saved only after that commit. A failing world drops
//! everything it staged and leaves the other tasks alone.

use rayon::prelude::*;

use crate::coords::{ChunkKey, ChunkPos};
use crate::error::Result;
use crate::layout::tree::{GroupUnit, WorldUnit};
use crate::merge::copy::{RecordCounts, relocate_records, stage_payload};
use crate::merge::report::{MergeReport, WorldReport};
use crate::store::{Backend, OpenParams, WorldStore, WriteBatch, open_store};

pub const DEFAULT_CONCURRENCY: usize = 30;

#[derive(Clone, Copy, Debug)]
pub struct MergeOptions {
    /// World tasks allowed to run at the same time (0 is treated as 1).
    pub concurrency: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Opens the source store of one world for the duration of its task.
pub type SourceOpener<'a> = dyn Fn(&WorldUnit) -> Result<Box<dyn WorldStore>> + Sync + 'a;

/// Opens `world.source` as an existing on-disk world.
pub fn open_source(world: &WorldUnit) -> Result<Box<dyn WorldStore>> {
    open_store(
        Backend::Fs,
        OpenParams {
            path: world.source.clone(),
            create: false,
        },
    )
}

/// Copies every world under `root` into `output` at its absolute offset.
/// Returns once every task has finished; per-world failures are reported,
/// not returned.
pub fn merge_tree(
    root: &GroupUnit,
    output: &dyn WorldStore,
    open: &SourceOpener<'_>,
    opts: &MergeOptions,
) -> Result<MergeReport> {
    let placements = root.placements();
    let total = placements.len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.concurrency.max(1))
        .thread_name(|i| format!("merge-{i}"))
        .build()?;

    let worlds: Vec<WorldReport> = pool.install(|| {
        placements
            .par_iter()
            .enumerate()
            .map(|(i, &(world, offset))| {
                tracing::info!("Adding {} {}/{}", world.name, i + 1, total);
                merge_world(world, offset, output, open)
            })
            .collect()
    });

    let report = MergeReport { worlds };
    tracing::info!(
        "merged {} chunks from {} worlds ({} failed, {} records skipped)",
        report.chunks(),
        total,
        report.failed().count(),
        report.skipped_records()
    );
    Ok(report)
}

/// Runs one world task, turning an error into a logged failure.
pub fn merge_world(
    world: &WorldUnit,
    offset: ChunkPos,
    output: &dyn WorldStore,
    open: &SourceOpener<'_>,
) -> WorldReport {
    let mut report = WorldReport::new(&world.name);
    if let Err(e) = copy_world(world, offset, output, open, &mut report) {
        tracing::error!("{}: {}", world.name, e);
        report.failure = Some(e.to_string());
    }
    report
}

fn copy_world(
    world: &WorldUnit,
    offset: ChunkPos,
    output: &dyn WorldStore,
    open: &SourceOpener<'_>,
    report: &mut WorldReport,
) -> Result<()> {
    let src = open(world)?;
    let block_offset = offset.to_block_offset();

    let mut batch = WriteBatch::with_capacity(world.chunks as usize * 16);
    let mut records = Vec::with_capacity(world.chunks as usize);
    let mut counts = RecordCounts::default();
    for key in src.chunk_positions() {
        let from = key?;
        let to = ChunkKey::new(offset + from.pos, from.dim);

        stage_payload(src.as_ref(), from, to, &mut batch)?;

        let (recs, c) = relocate_records(src.as_ref(), from, to, block_offset)?;
        counts.block_records += c.block_records;
        counts.entities += c.entities;
        counts.skipped += c.skipped;
        records.push(recs);
        tracing::debug!("{}: staged {:?} -> {:?}", world.name, from, to);
    }
    src.close()?;

    output.write_batch(batch)?;
    report.chunks = records.len() as u64;
    for recs in &records {
        recs.save(output)?;
    }
    report.block_records = counts.block_records;
    report.entities = counts.entities;
    report.skipped_records = counts.skipped;
    Ok(())
}
