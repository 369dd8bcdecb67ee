use std::fs;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

use worldmerge_core::store::level::LevelStore;
use worldmerge_core::store::{Backend, OpenParams, open_store};
use worldmerge_core::{
    GroupUnit, LayoutOptions, MergeOptions, Result, StageOptions, WorldSettings, archive,
    build_tree, layout_root, merge_tree, open_source, scan_extent, write_manifest,
};

use crate::presentation::cli::{Cli, LayoutArgs, MergeArgs};

fn print_merge_usage() -> Result<()> {
    let mut cmd = Cli::command();
    if let Some(merge) = cmd.find_subcommand_mut("merge") {
        merge.print_help()?;
    }
    Ok(())
}

/// Stages, scans and packs every world under `input`, then writes the manifest.
fn plan(input: &Path, layout: &LayoutArgs) -> Result<GroupUnit> {
    let stage = StageOptions {
        staging_dir: layout.staging.clone(),
        ..Default::default()
    };
    let mut root = build_tree(input, &stage)?;

    tracing::info!("Laying Out");
    layout_root(
        &mut root,
        &LayoutOptions {
            padding: layout.padding,
        },
    );
    write_manifest(&root, &layout.manifest)?;
    Ok(root)
}

pub fn handle_merge(args: MergeArgs) -> Result<()> {
    let Some(input) = args.input else {
        return print_merge_usage();
    };
    if args.output.exists() {
        fs::remove_dir_all(&args.output)?;
    }

    let root = plan(&input, &args.layout)?;

    tracing::info!("Generating Output World");
    let out = open_store(
        Backend::Fs,
        OpenParams {
            path: args.output.clone(),
            create: true,
        },
    )?;
    let opts = MergeOptions {
        concurrency: args.concurrency,
    };
    let report = merge_tree(&root, out.as_ref(), &open_source, &opts)?;
    out.save_settings(&WorldSettings::merged(args.deterministic))?;
    out.close()?;
    drop(out);

    if !args.no_archive {
        archive::pack(&args.archive, &args.output)?;
    }

    for w in report.failed() {
        eprintln!("failed: {} ({})", w.name, w.failure.as_deref().unwrap_or(""));
    }
    println!(
        "{} worlds, {} chunks, {} records skipped",
        report.worlds.len(),
        report.chunks(),
        report.skipped_records()
    );
    Ok(())
}

pub fn handle_plan(input: PathBuf, layout: LayoutArgs) -> Result<()> {
    let root = plan(&input, &layout)?;
    for (w, offset) in root.placements() {
        let size = w.total_bounds();
        println!(
            "{:<32} at ({:>6}, {:>6}) size ({:>5}, {:>5}) chunks={}",
            w.name, offset.x, offset.z, size.x, size.z, w.chunks
        );
    }
    let b = root.total_bounds();
    eprintln!("map: {}x{} chunks -> {}", b.x, b.z, layout.manifest.display());
    Ok(())
}

pub fn handle_inspect(world: PathBuf) -> Result<()> {
    let store = LevelStore::open(&world, false)?;
    let scan = scan_extent(&store)?;
    let size = scan.extent.size();
    if scan.extent.is_empty() {
        println!("extent: empty");
    } else {
        println!(
            "extent: ({}, {}) .. ({}, {})",
            scan.extent.min.x, scan.extent.min.z, scan.extent.max.x, scan.extent.max.z
        );
    }
    println!("size:   {} x {}", size.x, size.z);
    println!("chunks: {}", scan.chunks);
    println!("digest: {}", store.digest()?);
    Ok(())
}
