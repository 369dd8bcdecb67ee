use super::{CodecId, Compressor};
use crate::error::Result;

pub struct ZstdCompressor;

impl Compressor for ZstdCompressor {
    fn id(&self) -> CodecId {
        CodecId::Zstd
    }

    fn compress(&self, plain: &[u8], level: i32) -> Result<Vec<u8>> {
        Ok(zstd::stream::encode_all(plain, level.max(1))?)
    }

    fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>> {
        Ok(zstd::stream::decode_all(frame)?)
    }
}
