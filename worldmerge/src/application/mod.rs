pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use worldmerge_core::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => handlers::handle_merge(args),
        Commands::Plan { input, layout } => handlers::handle_plan(input, layout),
        Commands::Inspect { world } => handlers::handle_inspect(world),
    }
}
