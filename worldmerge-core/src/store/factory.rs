use std::path::PathBuf;

use crate::error::Result;
use crate::store::api::WorldStore;
use crate::store::level::LevelStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// `<path>/db/level.log` on disk.
    Fs,
    /// Unpersisted; `path` and `create` are ignored.
    Memory,
}

#[derive(Clone, Debug, Default)]
pub struct OpenParams {
    pub path: PathBuf,
    /// Create an empty world when none exists at `path`.
    pub create: bool,
}

pub fn open_store(backend: Backend, p: OpenParams) -> Result<Box<dyn WorldStore>> {
    match backend {
        Backend::Fs => Ok(Box::new(LevelStore::open(&p.path, p.create)?)),
        Backend::Memory => Ok(Box::new(LevelStore::in_memory())),
    }
}
