//! reviewscout CLI — restaurant-review acquisition tool.
//!
//! Crawls map.kakao.com result pages for a location+keyword query and
//! caches the extracted records in a local document store.

mod commands;

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
