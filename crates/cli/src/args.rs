//! Command-line arguments for `reach-launch`.

use std::path::PathBuf;

use clap::Parser;

/// Fill the SMS campaign wizard from a JSON file and launch the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "reach-launch", version)]
pub struct Args {
    /// Campaign description (JSON).
    #[arg(long, value_name = "FILE")]
    pub campaign: PathBuf,

    /// Recipients to import (CSV with a header row).
    #[arg(long, value_name = "FILE")]
    pub recipients: Option<PathBuf>,

    /// Resume an existing campaign instead of creating one.
    #[arg(long, value_name = "CAMPAIGN_ID")]
    pub edit: Option<String>,

    /// Overrides for the campaign defaults (JSON).
    #[arg(long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,

    /// Walk the wizard to review without launching.
    #[arg(long)]
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
