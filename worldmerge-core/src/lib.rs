#![forbid(unsafe_code)]

pub mod error;

pub mod coords;
pub mod extent;
pub mod record;
pub mod settings;

pub mod codec;

pub mod store {
    pub mod journal;
    pub mod keys;
    pub mod level;

    mod api;
    mod factory;

    pub use api::{ChunkPositions, Layer, WorldStore, WriteBatch};
    pub use factory::{Backend, OpenParams, open_store};
}

pub mod layout {
    pub mod pack;
    pub mod tree;
}

pub mod merge {
    pub mod copy;
    pub mod pipeline;
    pub mod report;
}

pub mod archive;
pub mod discover;
pub mod manifest;

// Re-exports: stable API surface
pub use coords::{ChunkKey, ChunkPos, Dimension};
pub use discover::{StageOptions, build_tree};
pub use error::{Result, WorldMergeError};
pub use extent::{Extent, scan_extent};
pub use layout::pack::{LayoutOptions, center_root, layout_group, layout_root};
pub use layout::tree::{GroupUnit, LayoutItem, WorldUnit};
pub use manifest::{Manifest, build_manifest, write_manifest};
pub use merge::pipeline::{MergeOptions, merge_tree, open_source};
pub use merge::report::{MergeReport, WorldReport};
pub use settings::{GameMode, WorldSettings};
