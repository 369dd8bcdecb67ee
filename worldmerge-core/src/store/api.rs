use crate::coords::ChunkKey;
use crate::error::Result;
use crate::record::Compound;
use crate::settings::WorldSettings;
use crate::store::keys;

/// One independently stored slice of a chunk's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Version,
    LegacyVersion,
    Data3d,
    Data2d,
    Finalized,
    SubChunk(i8),
}

impl Layer {
    pub fn key(self, chunk: ChunkKey) -> Vec<u8> {
        match self {
            Layer::Version => keys::tagged(chunk, keys::TAG_VERSION),
            Layer::LegacyVersion => keys::tagged(chunk, keys::TAG_VERSION_OLD),
            Layer::Data3d => keys::tagged(chunk, keys::TAG_DATA_3D),
            Layer::Data2d => keys::tagged(chunk, keys::TAG_DATA_2D),
            Layer::Finalized => keys::tagged(chunk, keys::TAG_FINALIZED),
            Layer::SubChunk(i) => keys::sub_chunk(chunk, i),
        }
    }
}

/// Puts staged in memory and committed to a store in one write.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    pub(crate) puts: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            puts: Vec::with_capacity(n),
        }
    }

    pub fn put_layer(&mut self, chunk: ChunkKey, layer: Layer, value: Vec<u8>) {
        self.puts.push((layer.key(chunk), value));
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }
}

/// Lazy, finite enumeration of the chunks present in a store.
pub type ChunkPositions<'a> = Box<dyn Iterator<Item = Result<ChunkKey>> + Send + 'a>;

/// The storage seam: source worlds are read through it, the merged world is
/// written through it. Implementations must serialize concurrent
/// `write_batch` commits themselves.
pub trait WorldStore: Send + Sync {
    fn chunk_positions(&self) -> ChunkPositions<'_>;

    /// `Ok(None)` when the chunk has nothing stored at this layer.
    fn load_layer(&self, chunk: ChunkKey, layer: Layer) -> Result<Option<Vec<u8>>>;

    fn write_batch(&self, batch: WriteBatch) -> Result<()>;

    fn load_block_metadata(&self, chunk: ChunkKey) -> Result<Vec<Compound>>;

    fn save_block_metadata(&self, chunk: ChunkKey, records: &[Compound]) -> Result<()>;

    fn load_entities(&self, chunk: ChunkKey) -> Result<Vec<Compound>>;

    fn save_entities(&self, chunk: ChunkKey, entities: &[Compound]) -> Result<()>;

    fn save_settings(&self, settings: &WorldSettings) -> Result<()>;

    /// Flushes anything pending and releases the handle.
    fn close(&self) -> Result<()>;
}
