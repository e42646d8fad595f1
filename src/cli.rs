//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file path.
const DEFAULT_CONFIG_PATH: &str = "./provider-loader.properties";

/// Download and process provider XML extracts from an SFTP drop zone.
///
/// The loader connects to the configured SFTP server, pulls the extract
/// files matching the configured pattern into a local inbox, and runs the
/// (currently stubbed) decrypt/parse/persist pipeline over them.
#[derive(Parser, Debug)]
#[command(name = "provider-loader")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the properties configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
