use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::coords::ChunkPos;
use crate::extent::{Extent, ExtentScan};

/// A source world: a leaf of the layout tree.
#[derive(Clone, Debug)]
pub struct WorldUnit {
    pub name: String,
    /// Unpacked world directory the chunks are read from.
    pub source: PathBuf,
    pub extent: Extent,
    pub chunks: u64,
    pub offset: ChunkPos,
}

impl WorldUnit {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>, scan: ExtentScan) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            extent: scan.extent,
            chunks: scan.chunks,
            offset: ChunkPos::ZERO,
        }
    }

    pub fn total_bounds(&self) -> ChunkPos {
        self.extent.size()
    }
}

/// A named collection of worlds and nested groups, packed as one unit.
#[derive(Clone, Debug, Default)]
pub struct GroupUnit {
    pub name: String,
    pub worlds: BTreeMap<String, WorldUnit>,
    pub groups: BTreeMap<String, GroupUnit>,

    pub columns: i32,
    pub column_width: i32,
    pub row_heights: Vec<i32>,

    pub offset: ChunkPos,
}

impl GroupUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn total_bounds(&self) -> ChunkPos {
        ChunkPos::new(
            self.columns * self.column_width,
            self.row_heights.iter().sum(),
        )
    }

    /// Files `world` under the group path `groups`, creating intermediate
    /// groups as needed. An empty path puts the world in `self`.
    pub fn insert(&mut self, groups: &[&str], world: WorldUnit) {
        match groups.split_first() {
            None => {
                if let Some(prev) = self.worlds.insert(world.name.clone(), world) {
                    tracing::warn!("world {} listed twice in group {:?}", prev.name, self.name);
                }
            }
            Some((head, rest)) => self
                .groups
                .entry((*head).to_string())
                .or_insert_with(|| GroupUnit::new(*head))
                .insert(rest, world),
        }
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len() + self.groups.values().map(GroupUnit::world_count).sum::<usize>()
    }

    /// Every world with its absolute offset, i.e. the sum of its own and all
    /// ancestor offsets, this group's included. Nested groups come before
    /// direct worlds, each in name order.
    pub fn placements(&self) -> Vec<(&WorldUnit, ChunkPos)> {
        let mut out = Vec::with_capacity(self.world_count());
        self.collect_placements(ChunkPos::ZERO, &mut out);
        out
    }

    fn collect_placements<'a>(&'a self, base: ChunkPos, out: &mut Vec<(&'a WorldUnit, ChunkPos)>) {
        let abs = base + self.offset;
        for g in self.groups.values() {
            g.collect_placements(abs, out);
        }
        for w in self.worlds.values() {
            out.push((w, abs + w.offset));
        }
    }
}

/// The packer's view of a child: either variant, sized and placeable.
pub enum LayoutItem<'a> {
    World(&'a mut WorldUnit),
    Group(&'a mut GroupUnit),
}

impl LayoutItem<'_> {
    pub fn total_bounds(&self) -> ChunkPos {
        match self {
            LayoutItem::World(w) => w.total_bounds(),
            LayoutItem::Group(g) => g.total_bounds(),
        }
    }

    pub fn set_offset(&mut self, offset: ChunkPos) {
        match self {
            LayoutItem::World(w) => w.offset = offset,
            LayoutItem::Group(g) => g.offset = offset,
        }
    }

    pub fn is_world(&self) -> bool {
        matches!(self, LayoutItem::World(_))
    }
}
