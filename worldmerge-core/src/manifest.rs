//! `map.json`: where every group and world ended up in the merged map.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coords::ChunkPos;
use crate::error::Result;
use crate::layout::tree::{GroupUnit, WorldUnit};

/// Key the root group is filed under.
pub const ROOT_KEY: &str = "root";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WorldEntry {
    pub name: String,
    pub size: ChunkPos,
    pub offset_absolute: ChunkPos,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GroupEntry {
    pub name: String,
    pub worlds: BTreeMap<String, WorldEntry>,
    pub groups: BTreeMap<String, GroupEntry>,
    pub size: ChunkPos,
    pub offset_absolute: ChunkPos,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    pub groups: BTreeMap<String, GroupEntry>,
}

impl Manifest {
    pub fn root(&self) -> Option<&GroupEntry> {
        self.groups.get(ROOT_KEY)
    }
}

fn world_entry(w: &WorldUnit, base: ChunkPos) -> WorldEntry {
    WorldEntry {
        name: w.name.clone(),
        size: w.total_bounds(),
        offset_absolute: base + w.offset,
    }
}

fn group_entry(g: &GroupUnit, base: ChunkPos) -> GroupEntry {
    let abs = base + g.offset;
    GroupEntry {
        name: g.name.clone(),
        worlds: g
            .worlds
            .iter()
            .map(|(k, w)| (k.clone(), world_entry(w, abs)))
            .collect(),
        groups: g
            .groups
            .iter()
            .map(|(k, c)| (k.clone(), group_entry(c, abs)))
            .collect(),
        size: g.total_bounds(),
        offset_absolute: abs,
    }
}

/// Mirrors the packed tree; offsets are accumulated from the root down.
pub fn build_manifest(root: &GroupUnit) -> Manifest {
    let mut groups = BTreeMap::new();
    groups.insert(ROOT_KEY.to_string(), group_entry(root, ChunkPos::ZERO));
    Manifest { groups }
}

/// Writes the manifest as indented JSON. The file is replaced atomically.
pub fn write_manifest(root: &GroupUnit, path: &Path) -> Result<()> {
    let manifest = build_manifest(root);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, &manifest)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let f = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(std::io::BufReader::new(f))?)
}
