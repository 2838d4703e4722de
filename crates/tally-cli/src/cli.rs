//! Command-line arguments of the `tally` binary.

use std::path::PathBuf;

use clap::Parser;

/// Matches the recipe of a manifest against its stock and prints what fits.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "tally", version, about)]
pub struct Args {
    /// Manifest describing the recipe and the stock
    pub manifest: PathBuf,

    /// Configuration file; the platform config directory is used otherwise
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the recipe as a JSON tag tree instead of the report
    #[arg(long)]
    pub json: bool,
}
