use std::collections::BTreeMap;

use worldmerge_core::record::{Compound, Tag};
use worldmerge_core::store::level::LevelStore;
use worldmerge_core::store::{
    Backend, ChunkPositions, Layer, OpenParams, WorldStore, WriteBatch, open_store,
};
use worldmerge_core::{
    ChunkKey, ChunkPos, Dimension, GroupUnit, LayoutOptions, MergeOptions, Result,
    WorldMergeError, WorldSettings, WorldUnit, build_manifest, layout_root, merge_tree,
    scan_extent,
};

fn ck(x: i32, z: i32) -> ChunkKey {
    ChunkKey::new(ChunkPos::new(x, z), Dimension::Overworld)
}

fn entity(x: f32, y: f32, z: f32) -> Compound {
    let mut e = Compound::new();
    e.insert("identifier".into(), Tag::String("minecraft:cow".into()));
    e.insert(
        "Pos".into(),
        Tag::List(vec![Tag::Float(x), Tag::Float(y), Tag::Float(z)]),
    );
    e
}

fn source(chunks: &[ChunkKey]) -> LevelStore {
    let s = LevelStore::in_memory();
    let mut b = WriteBatch::default();
    for &c in chunks {
        b.put_layer(c, Layer::Version, vec![40]);
        b.put_layer(c, Layer::Data3d, vec![c.pos.x as u8; 16]);
        b.put_layer(c, Layer::SubChunk(0), vec![9; 8]);
    }
    s.write_batch(b).unwrap();
    s
}

/// Sources by world name; every test world lives directly under the root.
struct Fixture {
    root: GroupUnit,
    stores: BTreeMap<String, LevelStore>,
}

impl Fixture {
    fn new(worlds: Vec<(&str, LevelStore)>) -> Self {
        let mut root = GroupUnit::new("");
        let mut stores = BTreeMap::new();
        for (name, store) in worlds {
            let scan = scan_extent(&store).unwrap();
            root.insert(&[], WorldUnit::new(name, name, scan));
            stores.insert(name.to_string(), store);
        }
        layout_root(&mut root, &LayoutOptions::default());
        Self { root, stores }
    }

    fn open(&self, w: &WorldUnit) -> Result<Box<dyn WorldStore>> {
        let s = self.stores.get(&w.name).cloned().ok_or_else(|| {
            WorldMergeError::NotAWorld(w.source.clone())
        })?;
        Ok(Box::new(s))
    }

    fn offset_of(&self, name: &str) -> ChunkPos {
        self.root
            .placements()
            .into_iter()
            .find(|(w, _)| w.name == name)
            .map(|(_, o)| o)
            .unwrap()
    }
}

#[test]
fn two_single_chunk_worlds_land_side_by_side() {
    let fx = Fixture::new(vec![("a", source(&[ck(0, 0)])), ("b", source(&[ck(0, 0)]))]);
    assert_eq!(fx.root.columns, 2);
    assert_eq!(fx.root.column_width, 81);
    assert_eq!(fx.root.worlds["a"].offset, ChunkPos::new(0, 0));
    assert_eq!(fx.root.worlds["b"].offset, ChunkPos::new(81, 0));

    let out = open_store(Backend::Memory, OpenParams::default()).unwrap();
    let report =
        merge_tree(&fx.root, out.as_ref(), &|w| fx.open(w), &MergeOptions::default()).unwrap();
    assert_eq!(report.chunks(), 2);
    assert_eq!(report.failed().count(), 0);

    let mut got: Vec<ChunkKey> = out.chunk_positions().collect::<Result<_>>().unwrap();
    got.sort();
    let mut want = vec![
        ChunkKey::new(fx.offset_of("a"), Dimension::Overworld),
        ChunkKey::new(fx.offset_of("b"), Dimension::Overworld),
    ];
    want.sort();
    assert_eq!(got, want);
    assert_eq!(
        out.load_layer(want[0], Layer::SubChunk(0)).unwrap(),
        Some(vec![9; 8])
    );
}

#[test]
fn entities_move_by_block_scaled_offset() {
    let src = source(&[ck(2, 3)]);
    src.save_entities(ck(2, 3), &[entity(40.5, 70.0, 55.25)]).unwrap();
    let fx = Fixture::new(vec![("only", src), ("other", source(&[ck(0, 0)]))]);

    let out = LevelStore::in_memory();
    merge_tree(&fx.root, &out, &|w| fx.open(w), &MergeOptions::default()).unwrap();

    let o = fx.offset_of("only");
    let moved = out
        .load_entities(ChunkKey::new(o + ChunkPos::new(2, 3), Dimension::Overworld))
        .unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(
        moved[0]["Pos"],
        Tag::List(vec![
            Tag::Float(40.5 + (o.x * 16) as f32),
            Tag::Float(70.0),
            Tag::Float(55.25 + (o.z * 16) as f32),
        ])
    );
    assert_eq!(moved[0]["identifier"], Tag::String("minecraft:cow".into()));
}

#[test]
fn entity_without_position_is_skipped_alone() {
    let src = source(&[ck(0, 0), ck(1, 0)]);
    let mut broken = entity(1.0, 2.0, 3.0);
    broken.remove("Pos");
    src.save_entities(ck(0, 0), &[entity(1.0, 2.0, 3.0), broken, entity(4.0, 5.0, 6.0)])
        .unwrap();
    let fx = Fixture::new(vec![("w", src)]);

    let out = LevelStore::in_memory();
    let report = merge_tree(&fx.root, &out, &|w| fx.open(w), &MergeOptions::default()).unwrap();
    let w = report.world("w").unwrap();
    assert!(w.succeeded());
    assert_eq!(w.chunks, 2);
    assert_eq!(w.entities, 2);
    assert_eq!(w.skipped_records, 1);

    let o = fx.offset_of("w");
    let saved = out
        .load_entities(ChunkKey::new(o, Dimension::Overworld))
        .unwrap();
    assert_eq!(saved.len(), 2);
}

/// Fails every payload read of one chunk; everything else passes through.
struct Faulty {
    inner: LevelStore,
    bad: ChunkKey,
}

impl WorldStore for Faulty {
    fn chunk_positions(&self) -> ChunkPositions<'_> {
        self.inner.chunk_positions()
    }

    fn load_layer(&self, chunk: ChunkKey, layer: Layer) -> Result<Option<Vec<u8>>> {
        if chunk == self.bad {
            return Err(WorldMergeError::Format("injected read failure".into()));
        }
        self.inner.load_layer(chunk, layer)
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        self.inner.write_batch(batch)
    }

    fn load_block_metadata(&self, chunk: ChunkKey) -> Result<Vec<Compound>> {
        self.inner.load_block_metadata(chunk)
    }

    fn save_block_metadata(&self, chunk: ChunkKey, records: &[Compound]) -> Result<()> {
        self.inner.save_block_metadata(chunk, records)
    }

    fn load_entities(&self, chunk: ChunkKey) -> Result<Vec<Compound>> {
        self.inner.load_entities(chunk)
    }

    fn save_entities(&self, chunk: ChunkKey, entities: &[Compound]) -> Result<()> {
        self.inner.save_entities(chunk, entities)
    }

    fn save_settings(&self, settings: &WorldSettings) -> Result<()> {
        self.inner.save_settings(settings)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

#[test]
fn failing_world_leaves_no_chunks_behind() {
    // Chunks enumerate in key order, so (0,0) and (1,0) are staged before
    // the read of (5,0) fails.
    let broken = source(&[ck(0, 0), ck(1, 0), ck(5, 0)]);
    broken
        .save_entities(ck(0, 0), &[entity(0.5, 64.0, 0.5)])
        .unwrap();
    let fx = Fixture::new(vec![("broken", broken), ("fine", source(&[ck(0, 0), ck(0, 1)]))]);

    let open = |w: &WorldUnit| -> Result<Box<dyn WorldStore>> {
        let inner = fx.stores[&w.name].clone();
        if w.name == "broken" {
            return Ok(Box::new(Faulty { inner, bad: ck(5, 0) }));
        }
        Ok(Box::new(inner))
    };

    let out = LevelStore::in_memory();
    let report = merge_tree(&fx.root, &out, &open, &MergeOptions { concurrency: 2 }).unwrap();

    let failed: Vec<_> = report.failed().map(|w| w.name.as_str()).collect();
    assert_eq!(failed, ["broken"]);
    assert_eq!(report.world("broken").unwrap().chunks, 0);
    assert_eq!(report.world("fine").unwrap().chunks, 2);

    let fine = fx.offset_of("fine");
    let mut got: Vec<ChunkKey> = out.chunk_positions().collect::<Result<_>>().unwrap();
    got.sort();
    assert_eq!(
        got,
        [
            ChunkKey::new(fine, Dimension::Overworld),
            ChunkKey::new(fine + ChunkPos::new(0, 1), Dimension::Overworld),
        ]
    );
    let b = fx.offset_of("broken");
    assert!(out
        .load_entities(ChunkKey::new(b, Dimension::Overworld))
        .unwrap()
        .is_empty());
}

#[test]
fn empty_world_is_packed_and_merged() {
    let fx = Fixture::new(vec![("empty", LevelStore::in_memory()), ("w", source(&[ck(0, 0)]))]);
    assert_eq!(fx.root.worlds["empty"].total_bounds(), ChunkPos::ZERO);
    assert!(fx.root.column_width > 0);
    assert!(fx.root.total_bounds().z > 0);

    let out = LevelStore::in_memory();
    let report = merge_tree(&fx.root, &out, &|w| fx.open(w), &MergeOptions::default()).unwrap();
    let e = report.world("empty").unwrap();
    assert!(e.succeeded());
    assert_eq!(e.chunks, 0);
    assert_eq!(report.chunks(), 1);
}

#[test]
fn rerun_produces_identical_output() {
    let run = || {
        let a = source(&[ck(-3, 4), ck(7, -2)]);
        let mut rec = Compound::new();
        rec.insert("x".into(), Tag::Int(-48));
        rec.insert("y".into(), Tag::Int(12));
        rec.insert("z".into(), Tag::Int(64));
        a.save_block_metadata(ck(-3, 4), &[rec]).unwrap();
        a.save_entities(ck(7, -2), &[entity(113.0, 80.0, -30.0)]).unwrap();
        let fx = Fixture::new(vec![
            ("a", a),
            ("b", source(&[ck(0, 0), ck(1, 1)])),
            ("c", source(&[ck(10, 10)])),
        ]);
        let out = LevelStore::in_memory();
        merge_tree(&fx.root, &out, &|w| fx.open(w), &MergeOptions { concurrency: 3 }).unwrap();
        (out.digest().unwrap(), build_manifest(&fx.root))
    };
    let (d1, m1) = run();
    let (d2, m2) = run();
    assert_eq!(d1, d2);
    assert_eq!(m1, m2);
}
