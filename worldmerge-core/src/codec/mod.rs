//! Frame codecs used by the store journal.

use crate::error::{Result, WorldMergeError};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    Store = 0,
    Zstd = 1,
}

impl TryFrom<u8> for CodecId {
    type Error = WorldMergeError;
    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(CodecId::Store),
            1 => Ok(CodecId::Zstd),
            x => Err(WorldMergeError::Format(format!("unknown codec id {x}"))),
        }
    }
}

pub trait Compressor: Send + Sync {
    fn id(&self) -> CodecId;
    fn compress(&self, plain: &[u8], level: i32) -> Result<Vec<u8>>;
    fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>>;
}

pub mod store;
pub mod zstdc;

pub fn compressor_for(id: CodecId) -> &'static dyn Compressor {
    match id {
        CodecId::Store => &store::Store,
        CodecId::Zstd => &zstdc::ZstdCompressor,
    }
}

/// Only accept compression if it saves at least this fraction.
pub const DEFAULT_MIN_GAIN: f32 = 0.05;

fn should_compress(u: usize, c: usize, min_gain: f32) -> bool {
    // true if (u - c) >= u * min_gain
    (u as f64 - c as f64) >= (u as f64 * min_gain as f64)
}

/// Trial-compresses `plain` with zstd and keeps it only when the gain clears
/// `min_gain`; otherwise the frame is stored as-is.
pub fn encode_frame(plain: &[u8], min_gain: f32) -> Result<(CodecId, Vec<u8>)> {
    let z = zstdc::ZstdCompressor.compress(plain, 3)?;
    if !plain.is_empty() && should_compress(plain.len(), z.len(), min_gain) {
        Ok((CodecId::Zstd, z))
    } else {
        Ok((CodecId::Store, plain.to_vec()))
    }
}

pub fn decode_frame(codec: CodecId, frame: &[u8]) -> Result<Vec<u8>> {
    compressor_for(codec).decompress(frame)
}
