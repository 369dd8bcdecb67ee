use crate::coords::{ChunkKey, ChunkPos};
use crate::error::{Result, WorldMergeError};
use crate::store::WorldStore;

/// Widest a world may be along either axis, in chunks. Wider worlds could
/// not be placed or have their block coordinates shifted without overflow.
pub const MAX_SPAN: i64 = 1 << 22;

fn span(min: i32, max: i32) -> i64 {
    max as i64 - min as i64 + 1
}

/// Bounding rectangle, in chunk coordinates, of every chunk present in a world.
///
/// Starts out inverted (min at `i32::MAX`, max at `i32::MIN`) so that folding
/// the first coordinate snaps both corners onto it. An extent that never saw a
/// coordinate stays inverted and reports a size of `(0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub min: ChunkPos,
    pub max: ChunkPos,
}

impl Default for Extent {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Extent {
    pub const EMPTY: Extent = Extent {
        min: ChunkPos::new(i32::MAX, i32::MAX),
        max: ChunkPos::new(i32::MIN, i32::MIN),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.z > self.max.z
    }

    pub fn include(&mut self, pos: ChunkPos) {
        self.min.x = self.min.x.min(pos.x);
        self.min.z = self.min.z.min(pos.z);
        self.max.x = self.max.x.max(pos.x);
        self.max.z = self.max.z.max(pos.z);
    }

    /// `max - min + 1` per axis, widened so extreme coordinates cannot
    /// overflow; `(0, 0)` for a world without chunks.
    pub fn span(&self) -> (i64, i64) {
        if self.is_empty() {
            return (0, 0);
        }
        (span(self.min.x, self.max.x), span(self.min.z, self.max.z))
    }

    /// [`Extent::span`] as a chunk size, saturating at `i32::MAX`.
    pub fn size(&self) -> ChunkPos {
        let (w, h) = self.span();
        let clamp = |v: i64| v.min(i32::MAX as i64) as i32;
        ChunkPos::new(clamp(w), clamp(h))
    }

    pub fn from_positions<I: IntoIterator<Item = ChunkPos>>(positions: I) -> Self {
        positions.into_iter().fold(Self::EMPTY, |mut e, p| {
            e.include(p);
            e
        })
    }
}

/// Outcome of one pass over a store's chunk index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtentScan {
    pub extent: Extent,
    pub chunks: u64,
}

/// Folds every chunk coordinate the store reports into an [`Extent`].
/// Dimensions are not distinguished: a chunk in any dimension widens the box.
/// A world wider than [`MAX_SPAN`] on either axis is rejected.
pub fn scan_extent(store: &dyn WorldStore) -> Result<ExtentScan> {
    let scan = store
        .chunk_positions()
        .try_fold(ExtentScan::default(), |mut scan, key| {
            let ChunkKey { pos, .. } = key?;
            scan.extent.include(pos);
            scan.chunks += 1;
            Ok::<_, WorldMergeError>(scan)
        })?;
    let (w, h) = scan.extent.span();
    if w > MAX_SPAN || h > MAX_SPAN {
        return Err(WorldMergeError::Format(format!(
            "chunks span {w}x{h}, more than {MAX_SPAN} per axis"
        )));
    }
    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Dimension;
    use crate::store::level::LevelStore;
    use crate::store::{Layer, WriteBatch};

    #[test]
    fn single_chunk_is_unit_sized() {
        let e = Extent::from_positions([ChunkPos::new(-4, 9)]);
        assert_eq!(e.min, ChunkPos::new(-4, 9));
        assert_eq!(e.max, ChunkPos::new(-4, 9));
        assert_eq!(e.size(), ChunkPos::new(1, 1));
    }

    #[test]
    fn axes_fold_independently() {
        let e = Extent::from_positions([
            ChunkPos::new(2, -3),
            ChunkPos::new(-5, 1),
            ChunkPos::new(0, 10),
        ]);
        assert_eq!(e.min, ChunkPos::new(-5, -3));
        assert_eq!(e.max, ChunkPos::new(2, 10));
        assert_eq!(e.size(), ChunkPos::new(8, 14));
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let e = Extent::from_positions([ChunkPos::new(i32::MIN, 0), ChunkPos::new(i32::MAX, 0)]);
        assert_eq!(e.span(), (1 << 32, 1));
        assert_eq!(e.size(), ChunkPos::new(i32::MAX, 1));
    }

    #[test]
    fn oversized_world_fails_its_scan() {
        let store = LevelStore::in_memory();
        let mut b = WriteBatch::default();
        for x in [i32::MIN, i32::MAX] {
            let c = ChunkKey::new(ChunkPos::new(x, 0), Dimension::Overworld);
            b.put_layer(c, Layer::Version, vec![40]);
        }
        store.write_batch(b).unwrap();
        assert!(matches!(scan_extent(&store), Err(WorldMergeError::Format(_))));

        let ok = LevelStore::in_memory();
        let mut b = WriteBatch::default();
        let c = ChunkKey::new(ChunkPos::new(-5, 7), Dimension::Nether);
        b.put_layer(c, Layer::Version, vec![40]);
        ok.write_batch(b).unwrap();
        let scan = scan_extent(&ok).unwrap();
        assert_eq!(scan.chunks, 1);
        assert_eq!(scan.extent.size(), ChunkPos::new(1, 1));
    }

    #[test]
    fn empty_world_has_zero_size() {
        let e = Extent::from_positions(std::iter::empty());
        assert!(e.is_empty());
        assert_eq!(e.size(), ChunkPos::ZERO);
    }
}
