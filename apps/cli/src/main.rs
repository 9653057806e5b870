//! Parcel CLI: valuation and feasibility reports for tokenizable real estate.
//!
//! Reads an asset description, builds assumptions, values the asset and
//! runs the analysis stages into one report.

mod analyst;
mod commands;
mod render;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
