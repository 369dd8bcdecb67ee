use std::fs;
use std::path::Path;

use worldmerge_core::archive;
use worldmerge_core::manifest::read_manifest;
use worldmerge_core::store::level::{LevelStore, read_settings};
use worldmerge_core::store::{Backend, Layer, OpenParams, WorldStore, WriteBatch, open_store};
use worldmerge_core::{
    ChunkKey, ChunkPos, Dimension, LayoutOptions, MergeOptions, StageOptions, WorldSettings,
    build_tree, layout_root, merge_tree, open_source, write_manifest,
};

/// Writes a world with the given overworld chunks and packs it to `dest`.
fn make_container(dest: &Path, chunks: &[(i32, i32)]) {
    let work = tempfile::tempdir().unwrap();
    let s = LevelStore::open(work.path(), true).unwrap();
    let mut b = WriteBatch::default();
    for &(x, z) in chunks {
        let c = ChunkKey::new(ChunkPos::new(x, z), Dimension::Overworld);
        b.put_layer(c, Layer::Version, vec![40]);
        b.put_layer(c, Layer::Data2d, vec![1; 32]);
    }
    s.write_batch(b).unwrap();
    s.close().unwrap();
    fs::create_dir_all(work.path().join("behavior_packs/pack")).unwrap();
    fs::write(work.path().join("behavior_packs/pack/manifest.json"), "{}").unwrap();

    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    archive::pack(dest, work.path()).unwrap();
}

#[test]
fn merges_a_directory_of_containers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    make_container(&input.join("lobby.mcworld"), &[(0, 0), (1, 0)]);
    make_container(&input.join("season1/castle.mcworld"), &[(-2, -2), (2, 2)]);
    make_container(&input.join("season1/week2/maze.mcworld"), &[(5, 5)]);
    fs::create_dir_all(input.join("season1/hollow.mcworld")).unwrap();

    let stage = StageOptions {
        staging_dir: dir.path().join("tmp"),
        ..Default::default()
    };
    let mut root = build_tree(&input, &stage).unwrap();
    assert_eq!(root.world_count(), 3);
    assert!(!stage.staging_dir.join("lobby.mcworld/behavior_packs").exists());
    assert!(stage.staging_dir.join("season1/castle.mcworld/db/level.log").is_file());
    assert_eq!(root.groups["season1"].worlds["castle"].total_bounds(), ChunkPos::new(5, 5));

    layout_root(&mut root, &LayoutOptions::default());
    let map = dir.path().join("map.json");
    write_manifest(&root, &map).unwrap();
    let manifest = read_manifest(&map).unwrap();
    let maze = &manifest.root().unwrap().groups["season1"].groups["week2"].worlds["maze"];
    assert_eq!(maze.size, ChunkPos::new(1, 1));

    let out_dir = dir.path().join("world-out");
    let out = open_store(
        Backend::Fs,
        OpenParams {
            path: out_dir.clone(),
            create: true,
        },
    )
    .unwrap();
    let report = merge_tree(&root, out.as_ref(), &open_source, &MergeOptions::default()).unwrap();
    assert_eq!(report.chunks(), 5);
    assert_eq!(report.failed().count(), 0);
    out.save_settings(&WorldSettings::merged(true)).unwrap();
    out.close().unwrap();
    drop(out);

    // the maze chunk sits at its manifest offset plus its source position
    let merged = LevelStore::open(&out_dir, false).unwrap();
    let at = ChunkKey::new(maze.offset_absolute + ChunkPos::new(5, 5), Dimension::Overworld);
    assert_eq!(merged.load_layer(at, Layer::Data2d).unwrap(), Some(vec![1; 32]));
    assert_eq!(merged.chunk_positions().count(), 5);
    assert_eq!(read_settings(&out_dir).unwrap().name, "world");

    let a = dir.path().join("world.mcworld");
    assert_eq!(archive::pack(&a, &out_dir).unwrap(), 3);
    let back = dir.path().join("unpacked");
    archive::unpack(&a, &back, None).unwrap();
    assert_eq!(
        LevelStore::open(&back, false).unwrap().digest().unwrap(),
        merged.digest().unwrap()
    );
}

#[test]
fn staged_worlds_are_reused() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    make_container(&input.join("w.mcworld"), &[(0, 0)]);
    let stage = StageOptions {
        staging_dir: dir.path().join("tmp"),
        ..Default::default()
    };
    build_tree(&input, &stage).unwrap();

    // replacing the container does not matter once it is staged
    make_container(&input.join("w.mcworld"), &[(0, 0), (9, 9)]);
    let root = build_tree(&input, &stage).unwrap();
    assert_eq!(root.worlds["w"].chunks, 1);
}
