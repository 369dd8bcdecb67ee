//! Turns an input directory of `.mcworld` files into a layout tree.
//!
//! Every container is unpacked once into the staging directory (mirroring
//! its path relative to the input root), opened, and scanned for its extent.
//! The directories between the input root and a container become its group
//! path; the file stem becomes the world name.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::archive::{self, exclude_segments};
use crate::error::{Result, WorldMergeError};
use crate::extent::scan_extent;
use crate::layout::tree::{GroupUnit, WorldUnit};
use crate::store::{Backend, OpenParams, open_store};

pub const WORLD_EXTENSION: &str = "mcworld";
pub const DEFAULT_STAGING_DIR: &str = "tmp";

#[derive(Clone, Debug)]
pub struct StageOptions {
    /// Where containers are unpacked. Existing entries are reused.
    pub staging_dir: PathBuf,
    /// Entry path segments left out when unpacking.
    pub exclude: Vec<String>,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            exclude: vec!["behavior_packs".into(), "resource_packs".into()],
        }
    }
}

fn has_world_extension(p: &Path) -> bool {
    p.extension() == Some(OsStr::new(WORLD_EXTENSION))
}

/// Every path under `input_root` ending in `.mcworld`, sorted.
pub fn discover(input_root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in WalkDir::new(input_root).follow_links(false) {
        let e = e.map_err(io::Error::other)?;
        if e.depth() > 0 && has_world_extension(e.path()) {
            out.push(e.into_path());
        }
    }
    out.sort();
    Ok(out)
}

/// Group path and world name of `path`, relative to `input_root`.
pub fn segments(input_root: &Path, path: &Path) -> Option<(Vec<String>, String)> {
    let rel = path.strip_prefix(input_root).ok()?;
    let mut parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.pop()?;
    let name = rel.file_stem()?.to_string_lossy().into_owned();
    Some((parts, name))
}

/// Unpacks `path` under the staging directory and returns the unpacked world
/// directory, or `None` when the input is a directory and was skipped.
pub fn stage_world(
    input_root: &Path,
    path: &Path,
    opts: &StageOptions,
) -> Result<Option<PathBuf>> {
    if path.is_dir() {
        tracing::warn!("Empty Folder {}", path.display());
        return Ok(None);
    }
    if !has_world_extension(path) {
        return Err(WorldMergeError::Extension {
            path: path.to_path_buf(),
        });
    }

    let rel = path.strip_prefix(input_root).unwrap_or(path);
    let staged = opts.staging_dir.join(rel);
    if staged.exists() {
        tracing::debug!("reusing {}", staged.display());
        return Ok(Some(staged));
    }

    let filter = exclude_segments(&opts.exclude);
    match archive::unpack(path, &staged, Some(&filter)) {
        Ok(n) => {
            tracing::debug!("unpacked {} files from {}", n, path.display());
            Ok(Some(staged))
        }
        Err(e) => {
            // A half-written staging dir would be reused by the next run.
            let _ = fs::remove_dir_all(&staged);
            Err(e)
        }
    }
}

fn load_world(
    input_root: &Path,
    path: &Path,
    opts: &StageOptions,
) -> Result<Option<(Vec<String>, WorldUnit)>> {
    let Some((groups, name)) = segments(input_root, path) else {
        return Err(WorldMergeError::Extension {
            path: path.to_path_buf(),
        });
    };
    let Some(dir) = stage_world(input_root, path, opts)? else {
        return Ok(None);
    };

    tracing::info!("Getting Bounds {}", dir.display());
    let store = open_store(
        Backend::Fs,
        OpenParams {
            path: dir.clone(),
            create: false,
        },
    )?;
    let scan = scan_extent(store.as_ref())?;
    store.close()?;
    Ok(Some((groups, WorldUnit::new(name, dir, scan))))
}

/// Builds the layout tree for every container under `input_root`. Inputs
/// that cannot be staged, opened or scanned are logged and left out.
pub fn build_tree(input_root: &Path, opts: &StageOptions) -> Result<GroupUnit> {
    let mut root = GroupUnit::new("");
    for path in discover(input_root)? {
        match load_world(input_root, &path, opts) {
            Ok(Some((groups, world))) => {
                let groups: Vec<&str> = groups.iter().map(String::as_str).collect();
                root.insert(&groups, world);
            }
            Ok(None) => {}
            Err(e) => tracing::error!("{}: {}", path.display(), e),
        }
    }
    if root.world_count() == 0 {
        tracing::warn!("no worlds found under {}", input_root.display());
    }
    Ok(root)
}
