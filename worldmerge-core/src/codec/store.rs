use super::{CodecId, Compressor};
use crate::error::Result;

pub struct Store;

impl Compressor for Store {
    fn id(&self) -> CodecId {
        CodecId::Store
    }

    fn compress(&self, plain: &[u8], _level: i32) -> Result<Vec<u8>> {
        Ok(plain.to_vec())
    }

    fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>> {
        Ok(frame.to_vec())
    }
}
