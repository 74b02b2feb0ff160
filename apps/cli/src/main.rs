//! nbindex CLI: plan an export layout and write navigable notebook indexes.
//!
//! Reads a scanned notebook inventory, plans where every page lands under
//! the export root, and writes `index.md` / `index.json` next to it.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
