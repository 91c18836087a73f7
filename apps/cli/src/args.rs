//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fpm")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Resolve feature-pack provisioning descriptors")]
pub struct Cli {
    /// Settings file (defaults to `fpm.toml` in the working directory, if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Log level override (`error`, `warn`, `info`, `debug`, `trace`)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve a descriptor and write the provisioned state of the installation
    Provision {
        /// Provisioning descriptor (TOML)
        descriptor: PathBuf,
        /// Feature-pack repository directory
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
        /// Installation directory receiving `.fpm/provisioned.json`
        #[arg(long, value_name = "DIR")]
        install_dir: Option<PathBuf>,
    },
    /// Resolve a descriptor and print every config feature by feature
    Describe {
        /// Provisioning descriptor (TOML)
        descriptor: PathBuf,
        /// Feature-pack repository directory
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
    },
    /// Print a summary of a persisted state file
    State {
        /// State file, e.g. `<install>/.fpm/provisioned.json`
        file: PathBuf,
    },
}
