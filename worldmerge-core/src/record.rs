//! Structured records attached to chunks: block metadata and entities.
//!
//! Records are NBT-shaped trees. The merge only ever touches their coordinate
//! fields; everything else is carried through untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorldMergeError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<u8>),
    List(Vec<Tag>),
    Compound(Compound),
}

pub type Compound = BTreeMap<String, Tag>;

/// Why a single record was left out of the coordinate rewrite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordIssue {
    MissingField(&'static str),
    WrongShape(&'static str),
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::MissingField(k) => write!(f, "missing field {k}"),
            RecordIssue::WrongShape(k) => write!(f, "field {k} has unexpected shape"),
        }
    }
}

fn int_field(rec: &Compound, key: &'static str) -> std::result::Result<i32, RecordIssue> {
    match rec.get(key) {
        Some(Tag::Int(v)) => Ok(*v),
        Some(_) => Err(RecordIssue::WrongShape(key)),
        None => Err(RecordIssue::MissingField(key)),
    }
}

/// Shifts a block-metadata record's `x`/`z` by a block-unit offset.
/// Both fields are checked before either is written.
pub fn relocate_block_record(
    rec: &mut Compound,
    (dx, dz): (i32, i32),
) -> std::result::Result<(), RecordIssue> {
    let x = int_field(rec, "x")?;
    let z = int_field(rec, "z")?;
    rec.insert("x".into(), Tag::Int(x + dx));
    rec.insert("z".into(), Tag::Int(z + dz));
    Ok(())
}

/// Shifts an entity's `Pos` (X and Z components) by a block-unit offset.
/// The vertical component stays as it was.
pub fn relocate_entity(
    rec: &mut Compound,
    (dx, dz): (i32, i32),
) -> std::result::Result<(), RecordIssue> {
    let pos = match rec.get_mut("Pos") {
        Some(Tag::List(items)) => items,
        Some(_) => return Err(RecordIssue::WrongShape("Pos")),
        None => return Err(RecordIssue::MissingField("Pos")),
    };
    match pos.as_mut_slice() {
        [Tag::Float(x), Tag::Float(_), Tag::Float(z)] => {
            *x += dx as f32;
            *z += dz as f32;
            Ok(())
        }
        _ => Err(RecordIssue::WrongShape("Pos")),
    }
}

pub fn encode_records(records: &[Compound]) -> Result<Vec<u8>> {
    serde_cbor::to_vec(&records).map_err(|e| WorldMergeError::Format(format!("record encode: {e}")))
}

pub fn decode_records(bytes: &[u8]) -> Result<Vec<Compound>> {
    serde_cbor::from_slice(bytes).map_err(|e| WorldMergeError::Format(format!("record decode: {e}")))
}
