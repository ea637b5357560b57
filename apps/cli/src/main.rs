//! Strandly CLI: blog content, sitemap generation, and the site proxy.
//!
//! Reads posts from the headless CMS through the resilient channel chain,
//! writes `sitemap.xml`, and serves the built site with an `/api` proxy.

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
