//! Grid packing of a layout tree.
//!
//! Each group lays its children out in a near-square grid of equal-width
//! columns. Sizes flow bottom-up: nested groups are packed first so their
//! totals are known when the parent places them.

use crate::coords::ChunkPos;
use crate::layout::tree::{GroupUnit, LayoutItem};

pub const DEFAULT_PADDING: i32 = 80;

#[derive(Clone, Copy, Debug)]
pub struct LayoutOptions {
    /// Spacing, in chunks, kept around world leaves.
    pub padding: i32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
        }
    }
}

/// `ceil(sqrt(n))`, at least 1.
pub fn columns_for(n: usize) -> i32 {
    let mut c = 1usize;
    while c * c < n {
        c += 1;
    }
    c as i32
}

/// Packs `g` and everything below it, assigning every child an offset
/// relative to `g` and deriving `g`'s own grid parameters.
///
/// Columns are `max child width + padding` wide. A row is as tall as its
/// tallest child, plus `padding` when the row holds at least one world; rows
/// of groups alone are stacked without spacing. A trailing partial row
/// counts toward the group's height.
pub fn layout_group(g: &mut GroupUnit, padding: i32) {
    for child in g.groups.values_mut() {
        layout_group(child, padding);
    }

    let mut children: Vec<LayoutItem<'_>> = g
        .groups
        .values_mut()
        .map(LayoutItem::Group)
        .chain(g.worlds.values_mut().map(LayoutItem::World))
        .collect();

    let columns = columns_for(children.len());
    let column_width = match children.iter().map(|c| c.total_bounds().x).max() {
        Some(w) => w + padding,
        None => 0,
    };

    let mut row_heights = Vec::new();
    let mut z = 0;
    let mut col = 0;
    let mut row_height = 0;
    let mut row_has_world = false;
    for child in children.iter_mut() {
        let bounds = child.total_bounds();
        child.set_offset(ChunkPos::new(col * column_width, z));
        row_height = row_height.max(bounds.z);
        row_has_world |= child.is_world();

        col += 1;
        if col == columns {
            let advance = row_height + if row_has_world { padding } else { 0 };
            row_heights.push(advance);
            z += advance;
            col = 0;
            row_height = 0;
            row_has_world = false;
        }
    }
    if col > 0 {
        row_heights.push(row_height + if row_has_world { padding } else { 0 });
    }
    drop(children);

    g.columns = columns;
    g.column_width = column_width;
    g.row_heights = row_heights;
}

/// Shifts the root by half its size so the merged map straddles the origin.
pub fn center_root(root: &mut GroupUnit) {
    root.offset = root.offset - root.total_bounds() / 2;
}

pub fn layout_root(root: &mut GroupUnit, opts: &LayoutOptions) {
    root.offset = ChunkPos::ZERO;
    layout_group(root, opts.padding.max(0));
    center_root(root);
    tracing::info!(
        "laid out {} worlds in {:?} chunks",
        root.world_count(),
        root.total_bounds()
    );
}
