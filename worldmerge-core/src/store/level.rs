//! Key/value level store: an ordered in-memory index, optionally persisted
//! through an append-only [`Journal`] under `<world>/db/level.log`.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use crate::coords::ChunkKey;
use crate::error::{Result, WorldMergeError};
use crate::record::{self, Compound};
use crate::settings::WorldSettings;
use crate::store::api::{ChunkPositions, Layer, WorldStore, WriteBatch};
use crate::store::journal::{Journal, LogRecord, Op};
use crate::store::keys;

pub const DB_DIR: &str = "db";
pub const LOG_FILE: &str = "level.log";
pub const SETTINGS_FILE: &str = "level.dat";
pub const NAME_FILE: &str = "levelname.txt";

type Index = BTreeMap<Vec<u8>, Vec<u8>>;

struct Inner {
    root: Option<PathBuf>,
    index: RwLock<Index>,
    // Commits take this lock first, so the log and the index agree on order.
    journal: Mutex<Option<Journal>>,
    settings: Mutex<Option<WorldSettings>>,
}

/// Cheap to clone; clones share one index and one log.
#[derive(Clone)]
pub struct LevelStore {
    inner: Arc<Inner>,
}

fn poisoned() -> WorldMergeError {
    WorldMergeError::Format("store lock poisoned".into())
}

fn apply(index: &mut Index, rec: LogRecord) {
    match rec {
        LogRecord::Batch(ops) => {
            for op in ops {
                match op {
                    Op::Put { key, value } => {
                        index.insert(key, value);
                    }
                    Op::Delete { key } => {
                        index.remove(&key);
                    }
                }
            }
        }
    }
}

impl LevelStore {
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                root: None,
                index: RwLock::new(Index::new()),
                journal: Mutex::new(None),
                settings: Mutex::new(None),
            }),
        }
    }

    /// Opens the world rooted at `root`. With `create` unset, a root without
    /// a level log is rejected as [`WorldMergeError::NotAWorld`].
    pub fn open(root: &Path, create: bool) -> Result<Self> {
        let db = root.join(DB_DIR);
        let log = db.join(LOG_FILE);
        if !create && !log.is_file() {
            return Err(WorldMergeError::NotAWorld(root.to_path_buf()));
        }
        fs::create_dir_all(&db)?;

        let mut journal = Journal::open(&log)?;
        let mut index = Index::new();
        let n = journal.replay(|rec| apply(&mut index, rec))?;
        tracing::debug!("{}: replayed {} batches, {} keys", root.display(), n, index.len());

        Ok(Self {
            inner: Arc::new(Inner {
                root: Some(root.to_path_buf()),
                index: RwLock::new(index),
                journal: Mutex::new(Some(journal)),
                settings: Mutex::new(None),
            }),
        })
    }

    pub fn root(&self) -> Option<&Path> {
        self.inner.root.as_deref()
    }

    fn read_index(&self) -> Result<RwLockReadGuard<'_, Index>> {
        self.inner.index.read().map_err(|_| poisoned())
    }

    fn commit(&self, ops: Vec<Op>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut journal = self.inner.journal.lock().map_err(|_| poisoned())?;
        let rec = LogRecord::Batch(ops);
        if let Some(j) = journal.as_mut() {
            j.append(&rec)?;
        }
        let mut index = self.inner.index.write().map_err(|_| poisoned())?;
        apply(&mut index, rec);
        Ok(())
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.read_index()?.get(key).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_index()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Content hash over every key/value pair in key order.
    pub fn digest(&self) -> Result<blake3::Hash> {
        let index = self.read_index()?;
        let mut h = blake3::Hasher::new();
        for (k, v) in index.iter() {
            h.update(&(k.len() as u64).to_le_bytes());
            h.update(k);
            h.update(&(v.len() as u64).to_le_bytes());
            h.update(v);
        }
        Ok(h.finalize())
    }

    /// Last settings saved through this handle.
    pub fn settings(&self) -> Option<WorldSettings> {
        self.inner.settings.lock().ok().and_then(|s| s.clone())
    }

    fn load_records(&self, chunk: ChunkKey, tag: u8) -> Result<Vec<Compound>> {
        match self.get(&keys::tagged(chunk, tag))? {
            Some(bytes) => record::decode_records(&bytes),
            None => Ok(Vec::new()),
        }
    }

    fn save_records(&self, chunk: ChunkKey, tag: u8, records: &[Compound]) -> Result<()> {
        let key = keys::tagged(chunk, tag);
        let op = if records.is_empty() {
            if self.get(&key)?.is_none() {
                return Ok(());
            }
            Op::Delete { key }
        } else {
            Op::Put {
                key,
                value: record::encode_records(records)?,
            }
        };
        self.commit(vec![op])
    }
}

/// Walks the index one marker key at a time, re-taking the read lock per
/// step, so enumeration neither copies the key set nor blocks writers.
struct ChunkCursor<'a> {
    store: &'a LevelStore,
    last: Option<Vec<u8>>,
    done: bool,
}

impl Iterator for ChunkCursor<'_> {
    type Item = Result<ChunkKey>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let store = self.store;
        let index = match store.read_index() {
            Ok(g) => g,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let start = match &self.last {
            Some(k) => Bound::Excluded(k.as_slice()),
            None => Bound::Unbounded,
        };
        for (k, _) in index.range::<[u8], _>((start, Bound::Unbounded)) {
            let Some(ck) = keys::chunk_marker(k) else {
                continue;
            };
            // A chunk carrying both markers is reported once, at `,`.
            if k.last() == Some(&keys::TAG_VERSION_OLD)
                && index.contains_key(&keys::tagged(ck, keys::TAG_VERSION))
            {
                continue;
            }
            self.last = Some(k.clone());
            return Some(Ok(ck));
        }
        self.done = true;
        None
    }
}

impl WorldStore for LevelStore {
    fn chunk_positions(&self) -> ChunkPositions<'_> {
        Box::new(ChunkCursor {
            store: self,
            last: None,
            done: false,
        })
    }

    fn load_layer(&self, chunk: ChunkKey, layer: Layer) -> Result<Option<Vec<u8>>> {
        self.get(&layer.key(chunk))
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch
            .puts
            .into_iter()
            .map(|(key, value)| Op::Put { key, value })
            .collect();
        self.commit(ops)
    }

    fn load_block_metadata(&self, chunk: ChunkKey) -> Result<Vec<Compound>> {
        self.load_records(chunk, keys::TAG_BLOCK_METADATA)
    }

    fn save_block_metadata(&self, chunk: ChunkKey, records: &[Compound]) -> Result<()> {
        self.save_records(chunk, keys::TAG_BLOCK_METADATA, records)
    }

    fn load_entities(&self, chunk: ChunkKey) -> Result<Vec<Compound>> {
        self.load_records(chunk, keys::TAG_ENTITIES)
    }

    fn save_entities(&self, chunk: ChunkKey, entities: &[Compound]) -> Result<()> {
        self.save_records(chunk, keys::TAG_ENTITIES, entities)
    }

    fn save_settings(&self, settings: &WorldSettings) -> Result<()> {
        if let Some(root) = self.root() {
            let mut buf = Vec::new();
            ciborium::ser::into_writer(settings, &mut buf)
                .map_err(|e| WorldMergeError::Format(format!("settings encode: {e}")))?;
            fs::write(root.join(SETTINGS_FILE), buf)?;
            fs::write(root.join(NAME_FILE), &settings.name)?;
        }
        *self.inner.settings.lock().map_err(|_| poisoned())? = Some(settings.clone());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut journal = self.inner.journal.lock().map_err(|_| poisoned())?;
        if let Some(j) = journal.as_mut() {
            j.sync()?;
        }
        Ok(())
    }
}

/// Reads back the settings file of a persisted world.
pub fn read_settings(root: &Path) -> Result<WorldSettings> {
    let bytes = fs::read(root.join(SETTINGS_FILE))?;
    ciborium::de::from_reader(&bytes[..])
        .map_err(|e| WorldMergeError::Format(format!("settings decode: {e}")))
}
