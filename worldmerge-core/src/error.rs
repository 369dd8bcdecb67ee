use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldMergeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("{} is not a world (no database)", .0.display())]
    NotAWorld(PathBuf),

    #[error("{} is not an .mcworld", path.display())]
    Extension { path: PathBuf },
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, WorldMergeError>;
