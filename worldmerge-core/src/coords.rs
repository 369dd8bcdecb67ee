use std::ops::{Add, Div, RangeInclusive, Sub};

use serde::{Deserialize, Serialize};

/// One chunk column spans this many blocks along X and Z.
pub const BLOCKS_PER_CHUNK: i32 = 16;

/// Position of a chunk column, written as `[x, z]` in JSON documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const ZERO: ChunkPos = ChunkPos { x: 0, z: 0 };

    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Displacement in block units for a chunk displacement.
    #[inline]
    pub fn to_block_offset(self) -> (i32, i32) {
        (self.x * BLOCKS_PER_CHUNK, self.z * BLOCKS_PER_CHUNK)
    }
}

impl Add for ChunkPos {
    type Output = ChunkPos;
    fn add(self, rhs: ChunkPos) -> ChunkPos {
        ChunkPos::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for ChunkPos {
    type Output = ChunkPos;
    fn sub(self, rhs: ChunkPos) -> ChunkPos {
        ChunkPos::new(self.x - rhs.x, self.z - rhs.z)
    }
}

/// Component-wise division, truncating toward zero.
impl Div<i32> for ChunkPos {
    type Output = ChunkPos;
    fn div(self, d: i32) -> ChunkPos {
        ChunkPos::new(self.x / d, self.z / d)
    }
}

impl From<[i32; 2]> for ChunkPos {
    fn from(v: [i32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<ChunkPos> for [i32; 2] {
    fn from(p: ChunkPos) -> Self {
        [p.x, p.z]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    #[default]
    Overworld,
    Nether,
    End,
}

impl Dimension {
    pub fn id(self) -> u32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Dimension::Overworld),
            1 => Some(Dimension::Nether),
            2 => Some(Dimension::End),
            _ => None,
        }
    }

    /// Inclusive block Y range.
    pub fn height_range(self) -> RangeInclusive<i32> {
        match self {
            Dimension::Overworld => -64..=319,
            Dimension::Nether => 0..=127,
            Dimension::End => 0..=255,
        }
    }

    /// Subchunk indices that may hold data in this dimension.
    pub fn sub_chunk_range(self) -> RangeInclusive<i8> {
        let r = self.height_range();
        ((*r.start() >> 4) as i8)..=((*r.end() >> 4) as i8)
    }
}

/// Address of one stored chunk: position plus the dimension it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey {
    pub pos: ChunkPos,
    pub dim: Dimension,
}

impl ChunkKey {
    pub const fn new(pos: ChunkPos, dim: Dimension) -> Self {
        Self { pos, dim }
    }
}
