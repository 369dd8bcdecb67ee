//! Chunk key layout in the level database.
//!
//! A key is `x:u32le z:u32le`, followed by `dim:u32le` outside the overworld,
//! followed by a one-byte tag and, for subchunks, the subchunk index.

use crate::coords::{ChunkKey, ChunkPos, Dimension};

// Keys on a per-chunk basis.
pub const TAG_VERSION: u8 = b',';
pub const TAG_VERSION_OLD: u8 = b'v';
pub const TAG_DATA_3D: u8 = b'+';
pub const TAG_DATA_2D: u8 = b'-';
pub const TAG_FINALIZED: u8 = b'6';
pub const TAG_BLOCK_METADATA: u8 = b'1';
pub const TAG_ENTITIES: u8 = b'2';

// Keys on a per-subchunk basis, followed by the subchunk index.
pub const TAG_SUB_CHUNK: u8 = b'/';

/// Chunk version written when the source carries no marker.
pub const CHUNK_VERSION: u8 = 40;

pub fn chunk_prefix(key: ChunkKey) -> Vec<u8> {
    let mut b = Vec::with_capacity(14);
    b.extend_from_slice(&(key.pos.x as u32).to_le_bytes());
    b.extend_from_slice(&(key.pos.z as u32).to_le_bytes());
    if key.dim != Dimension::Overworld {
        b.extend_from_slice(&key.dim.id().to_le_bytes());
    }
    b
}

pub fn tagged(key: ChunkKey, tag: u8) -> Vec<u8> {
    let mut b = chunk_prefix(key);
    b.push(tag);
    b
}

pub fn sub_chunk(key: ChunkKey, index: i8) -> Vec<u8> {
    let mut b = tagged(key, TAG_SUB_CHUNK);
    b.push(index as u8);
    b
}

#[inline]
fn le32(x: &[u8]) -> u32 {
    u32::from_le_bytes([x[0], x[1], x[2], x[3]])
}

/// Decodes a per-chunk key (`prefix + tag`) into its chunk and tag.
/// Subchunk keys and keys from other namespaces yield `None`.
pub fn decode_tagged(key: &[u8]) -> Option<(ChunkKey, u8)> {
    let (dim, tag) = match key.len() {
        9 => (Dimension::Overworld, key[8]),
        13 => (Dimension::from_id(le32(&key[8..12]))?, key[12]),
        _ => return None,
    };
    let pos = ChunkPos::new(le32(&key[0..4]) as i32, le32(&key[4..8]) as i32);
    Some((ChunkKey::new(pos, dim), tag))
}

/// The chunk a key marks as present, if it is a version marker.
pub fn chunk_marker(key: &[u8]) -> Option<ChunkKey> {
    match decode_tagged(key)? {
        (ck, TAG_VERSION | TAG_VERSION_OLD) => Some(ck),
        _ => None,
    }
}
