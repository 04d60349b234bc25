use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// archstrap - Interactive two-phase Arch Linux installer
#[derive(Parser)]
#[command(name = "archstrap")]
#[command(about = "Installs Arch Linux on a UEFI machine in two phases: bootstrap, then configure")]
#[command(version)]
pub struct Cli {
    /// JSON file overriding the built-in installation constants
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skip the root and required-binary checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Partition, format and mount the disk, then install the base system
    Bootstrap,
    /// Configure the new system; run inside arch-chroot
    Configure,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the effective configuration as JSON
    PrintConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
