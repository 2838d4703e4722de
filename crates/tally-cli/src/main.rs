//! # Tally
//!
//! Command-line entry point: matches the recipe of a manifest against its
//! stock and prints what fits.
//!
//! ```text
//! tally <manifest.toml> [--config <tally.toml>] [--json]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use clap::Parser;
use tally_cli::cli::Args;
use tally_cli::config::TallyConfig;
use tally_cli::manifest::Manifest;
use tally_cli::report::Report;
use tally_items::tag::ToTag;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tally=info".parse()?))
        .init();

    info!("Tally {}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => TallyConfig::load_from(path),
        None => TallyConfig::load(),
    };
    let catalog = config.catalog();

    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let recipe = manifest.recipe();
    let container = manifest.stock_container(&config, &catalog);

    if args.json {
        let tree = recipe.to_tag();
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    let report = Report::build(&recipe, &container, &catalog);
    println!("{report}");
    for stack in recipe.lored_count_representation(&catalog) {
        println!("  {} | {}", stack.item, stack.item.meta().lore().join(" / "));
    }
    Ok(())
}
