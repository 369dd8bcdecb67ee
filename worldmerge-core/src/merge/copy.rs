//! Per-chunk relocation: payload layers are re-keyed, records rewritten.

use crate::coords::ChunkKey;
use crate::error::Result;
use crate::record::{Compound, relocate_block_record, relocate_entity};
use crate::store::keys::CHUNK_VERSION;
use crate::store::{Layer, WorldStore, WriteBatch};

const CHUNK_LAYERS: [Layer; 3] = [Layer::Data3d, Layer::Data2d, Layer::Finalized];

/// Stages every payload layer of `from` into `batch` under `to`. Layers the
/// source does not have are skipped. The version marker is always written,
/// falling back to the legacy marker and then to [`CHUNK_VERSION`].
pub fn stage_payload(
    src: &dyn WorldStore,
    from: ChunkKey,
    to: ChunkKey,
    batch: &mut WriteBatch,
) -> Result<()> {
    let version = match src.load_layer(from, Layer::Version)? {
        Some(v) => v,
        None => src
            .load_layer(from, Layer::LegacyVersion)?
            .unwrap_or_else(|| vec![CHUNK_VERSION]),
    };
    batch.put_layer(to, Layer::Version, version);

    for layer in CHUNK_LAYERS {
        if let Some(v) = src.load_layer(from, layer)? {
            batch.put_layer(to, layer, v);
        }
    }

    for i in from.dim.sub_chunk_range() {
        // No sub chunk at this Y level; higher ones might still be present.
        let Some(v) = src.load_layer(from, Layer::SubChunk(i))? else {
            continue;
        };
        batch.put_layer(to, Layer::SubChunk(i), v);
    }
    Ok(())
}

/// Records written and records left out of the rewrite for one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub block_records: u64,
    pub entities: u64,
    pub skipped: u64,
}

/// Rewritten records of one chunk, waiting to be saved under `to`.
#[derive(Clone, Debug)]
pub struct RelocatedRecords {
    pub to: ChunkKey,
    pub blocks: Vec<Compound>,
    pub entities: Vec<Compound>,
}

impl RelocatedRecords {
    pub fn save(&self, out: &dyn WorldStore) -> Result<()> {
        out.save_block_metadata(self.to, &self.blocks)?;
        out.save_entities(self.to, &self.entities)
    }
}

/// Loads block metadata and entities of `from` and shifts their block
/// coordinates by `block_offset`.
///
/// A block record without usable `x`/`z` is kept verbatim; an entity without
/// a usable `Pos` is dropped. Both count as skipped.
pub fn relocate_records(
    src: &dyn WorldStore,
    from: ChunkKey,
    to: ChunkKey,
    block_offset: (i32, i32),
) -> Result<(RelocatedRecords, RecordCounts)> {
    let mut counts = RecordCounts::default();

    let mut blocks = src.load_block_metadata(from)?;
    for rec in blocks.iter_mut() {
        if let Err(issue) = relocate_block_record(rec, block_offset) {
            tracing::warn!("block record at {:?}: {}, kept as is", from, issue);
            counts.skipped += 1;
        }
    }
    counts.block_records = blocks.len() as u64;

    let loaded = src.load_entities(from)?;
    let mut entities: Vec<Compound> = Vec::with_capacity(loaded.len());
    for mut e in loaded {
        match relocate_entity(&mut e, block_offset) {
            Ok(()) => entities.push(e),
            Err(issue) => {
                tracing::warn!("entity in {:?}: {}, skipped", from, issue);
                counts.skipped += 1;
            }
        }
    }
    counts.entities = entities.len() as u64;

    Ok((
        RelocatedRecords {
            to,
            blocks,
            entities,
        },
        counts,
    ))
}
