//! `.mcworld` containers: plain zip files holding a world directory.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::Result;

/// Entry filter used while unpacking; returns false to leave an entry out.
pub type EntryFilter<'a> = dyn Fn(&str) -> bool + 'a;

/// Accepts entries with no path segment listed in `exclude`.
pub fn exclude_segments(exclude: &[String]) -> impl Fn(&str) -> bool + '_ {
    move |name: &str| {
        !name
            .split('/')
            .any(|seg| exclude.iter().any(|e| e == seg))
    }
}

fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || rel.contains('\\') {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("unsafe path: {rel}")).into());
    }
    Ok(root.join(p))
}

/// Extracts `archive` into `dest`. Returns the number of files written.
pub fn unpack(archive: &Path, dest: &Path, filter: Option<&EntryFilter<'_>>) -> Result<usize> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    fs::create_dir_all(dest)?;

    let mut written = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if filter.is_some_and(|f| !f(&name)) {
            tracing::debug!("{}: skipping {}", archive.display(), name);
            continue;
        }
        let out = safe_join(dest, name.trim_end_matches('/'))?;
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = BufWriter::new(File::create(&out)?);
        io::copy(&mut entry, &mut f)?;
        written += 1;
    }
    Ok(written)
}

/// Writes every file under `source_dir` into a new uncompressed zip at
/// `dest_archive`. Entries are sorted and carry a fixed timestamp, so the
/// same tree always produces the same bytes.
pub fn pack(dest_archive: &Path, source_dir: &Path) -> Result<usize> {
    let mut files = Vec::new();
    for e in WalkDir::new(source_dir).follow_links(false).sort_by_file_name() {
        let e = e.map_err(io::Error::other)?;
        if e.file_type().is_file() {
            files.push(e.into_path());
        }
    }

    let opts = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(BufWriter::new(File::create(dest_archive)?));
    for p in &files {
        let rel = p
            .strip_prefix(source_dir)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(name, opts)?;
        io::copy(&mut BufReader::new(File::open(p)?), &mut zip)?;
    }
    zip.finish()?;
    tracing::info!("packed {} files into {}", files.len(), dest_archive.display());
    Ok(files.len())
}
