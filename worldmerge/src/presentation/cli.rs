use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use worldmerge_core::discover::DEFAULT_STAGING_DIR;
use worldmerge_core::layout::pack::DEFAULT_PADDING;
use worldmerge_core::merge::pipeline::DEFAULT_CONCURRENCY;

#[derive(Parser)]
#[command(author, version, about = "Merge a directory of worlds into one map", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct LayoutArgs {
    /// Directory where containers are unpacked (reused between runs)
    #[arg(long, default_value = DEFAULT_STAGING_DIR)]
    pub staging: PathBuf,

    /// Spacing between worlds, in chunks
    #[arg(long, default_value_t = DEFAULT_PADDING)]
    pub padding: i32,

    /// Where the layout manifest is written
    #[arg(long, default_value = "map.json")]
    pub manifest: PathBuf,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Directory searched for .mcworld files; group names follow its layout
    pub input: Option<PathBuf>,

    /// Output world directory (removed before the run)
    #[arg(default_value = "world-out")]
    pub output: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Packaged output world
    #[arg(long, default_value = "world.mcworld")]
    pub archive: PathBuf,

    /// Worlds merged at the same time
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Zero timestamps so repeated runs give identical output
    #[arg(long)]
    pub deterministic: bool,

    /// Leave the output as a directory
    #[arg(long)]
    pub no_archive: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge every world under INPUT into one world
    Merge(MergeArgs),

    /// Stage and lay out INPUT, writing only the manifest
    Plan {
        input: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print extent and chunk count of one unpacked world
    Inspect { world: PathBuf },
}
