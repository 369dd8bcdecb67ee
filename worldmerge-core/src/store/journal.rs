//! Append-only log backing a persisted level store.
//!
//! Layout: `MAGIC VERSION` header, then frames of
//! `uvarint(len) codec:u8 blake3(plain):[u8; 32] payload[len - 33]`,
//! where `plain` is the CBOR encoding of one [`LogRecord`].

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, CodecId, DEFAULT_MIN_GAIN};
use crate::error::{Result, WorldMergeError};

const MAGIC: &[u8; 8] = b"WMLEVEL\0";
const VERSION: u8 = 1;
const HEADER_LEN: u64 = MAGIC.len() as u64 + 1;
const FRAME_META: usize = 1 + 32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum LogRecord {
    /// Applied all-or-nothing on replay.
    Batch(Vec<Op>),
}

pub struct Journal {
    f: File,
    path: PathBuf,
    min_gain: f32,
}

fn put_uvarint(out: &mut Vec<u8>, mut x: u64) {
    while x >= 0x80 {
        out.push((x as u8) | 0x80);
        x >>= 7;
    }
    out.push(x as u8);
}

fn get_uvarint<R: Read>(r: &mut R) -> Result<Option<u64>> {
    let mut x: u64 = 0;
    let mut s: u32 = 0;
    for _ in 0..10 {
        let mut b = [0u8; 1];
        match r.read(&mut b) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                let byte = b[0];
                if byte < 0x80 {
                    x |= (byte as u64) << s;
                    return Ok(Some(x));
                }
                x |= ((byte & 0x7f) as u64) << s;
                s += 7;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(WorldMergeError::Format("varint too long".into()))
}

/// Reads one frame. `Ok(None)` on a clean end of log or a torn final frame.
fn read_next_record(f: &mut File) -> Result<Option<LogRecord>> {
    let len = match get_uvarint(f)? {
        Some(n) => n,
        None => return Ok(None),
    };
    if len < FRAME_META as u64 {
        return Err(WorldMergeError::Format(format!("frame too short: {len}")));
    }
    // A length past the end of the file is a frame that was never finished.
    let left = f.metadata()?.len().saturating_sub(f.stream_position()?);
    if len > left {
        return Ok(None);
    }
    let len = len as usize;

    let mut buf = vec![0u8; len];
    if let Err(e) = f.read_exact(&mut buf) {
        if e.kind() == ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(e.into());
    }

    let codec = CodecId::try_from(buf[0])?;
    let plain = codec::decode_frame(codec, &buf[FRAME_META..])?;
    if blake3::hash(&plain).as_bytes() != &buf[1..FRAME_META] {
        return Err(WorldMergeError::Format("log frame checksum mismatch".into()));
    }

    let rec: LogRecord = serde_cbor::from_slice(&plain)
        .map_err(|e| WorldMergeError::Format(format!("log record decode: {e}")))?;
    Ok(Some(rec))
}

impl Journal {
    /// Opens the log at `path`, writing a fresh header if the file is new.
    pub fn open(path: &Path) -> Result<Self> {
        let existed = path.exists();
        let mut f = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if !existed || f.metadata()?.len() == 0 {
            f.write_all(MAGIC)?;
            f.write_all(&[VERSION])?;
            f.flush()?;
        } else {
            let mut magic = [0u8; 8];
            f.read_exact(&mut magic)?;
            if &magic != MAGIC {
                return Err(WorldMergeError::Format(format!(
                    "{}: not a level log",
                    path.display()
                )));
            }
            let mut ver = [0u8; 1];
            f.read_exact(&mut ver)?;
            if ver[0] != VERSION {
                return Err(WorldMergeError::Format(format!(
                    "unsupported level log version {}",
                    ver[0]
                )));
            }
        }
        f.seek(SeekFrom::End(0))?;
        Ok(Self {
            f,
            path: path.to_path_buf(),
            min_gain: DEFAULT_MIN_GAIN,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Feeds every intact record to `apply`, then cuts off a torn tail so
    /// later appends start on a frame boundary. Returns the record count.
    pub fn replay<F: FnMut(LogRecord)>(&mut self, mut apply: F) -> Result<u64> {
        self.f.seek(SeekFrom::Start(HEADER_LEN))?;
        let mut good_end = HEADER_LEN;
        let mut n = 0u64;
        while let Some(rec) = read_next_record(&mut self.f)? {
            apply(rec);
            n += 1;
            good_end = self.f.stream_position()?;
        }
        if self.f.metadata()?.len() > good_end {
            tracing::warn!(
                "{}: dropping torn tail after {} records",
                self.path.display(),
                n
            );
            self.f.set_len(good_end)?;
        }
        self.f.seek(SeekFrom::End(0))?;
        Ok(n)
    }

    /// Appends one record as a single frame.
    pub fn append(&mut self, rec: &LogRecord) -> Result<()> {
        let plain = serde_cbor::to_vec(rec)
            .map_err(|e| WorldMergeError::Format(format!("log record encode: {e}")))?;
        let (codec, payload) = codec::encode_frame(&plain, self.min_gain)?;

        let mut frame = Vec::with_capacity(10 + FRAME_META + payload.len());
        put_uvarint(&mut frame, (FRAME_META + payload.len()) as u64);
        frame.push(codec as u8);
        frame.extend_from_slice(blake3::hash(&plain).as_bytes());
        frame.extend_from_slice(&payload);

        self.f.write_all(&frame)?;
        self.f.flush()?;
        Ok(())
    }

    pub fn sync(&mut self) -> Result<()> {
        self.f.sync_all()?;
        Ok(())
    }
}
