//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "lektio",
    version,
    about = "Extract structured assignment records from uploaded documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the extraction pipeline on a PDF or image file.
    Extract(ExtractArgs),
    /// Fill the missing fields of a previously extracted record.
    Complete(CompleteArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Document to process (.pdf, .jpg, .png, .gif, .bmp, .webp).
    pub file: PathBuf,

    /// JSON file with the known-subject catalog: [{"id", "name", "code"?}].
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Pretty-print the resulting record.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct CompleteArgs {
    /// JSON file containing the record returned by `extract`.
    pub record: PathBuf,

    /// Subject chosen by the user.
    #[arg(long)]
    pub subject: Option<String>,

    /// Deadline chosen by the user (any supported date format).
    #[arg(long)]
    pub deadline: Option<String>,

    /// Pretty-print the resulting record.
    #[arg(long)]
    pub pretty: bool,
}
