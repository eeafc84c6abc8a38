use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "imgstore",
    about = "Content-addressed image store with reference-counted pruning",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Image root directory (overrides the config file)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store an image file and add references to it
    Add(AddArgs),
    /// Print the locator of a stored image
    Get(IdArgs),
    /// Delete a stored image
    Delete(IdArgs),
    /// Delete every image with no references
    Prune,
    /// List stored images
    List,
    /// Compare the image directory against the reference ledger
    Check,
    /// Inspect or adjust reference counts
    #[command(subcommand)]
    Refs(RefsCommand),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub file: PathBuf,
    /// MIME type; guessed from the file extension when omitted
    #[arg(short, long)]
    pub mimetype: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub confirmed: u64,
    #[arg(long, default_value_t = 0)]
    pub unconfirmed: u64,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Subcommand, Debug)]
pub enum RefsCommand {
    /// Show one entry, or all of them
    Show { id: Option<String> },
    /// Replace an entry's counts
    Set {
        id: String,
        confirmed: u64,
        unconfirmed: u64,
    },
    /// Remove an entry
    Remove { id: String },
}
