//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Dockyard - Container image builds with isolated registry logins
///
/// Logs into every configured registry inside a throwaway DOCKER_CONFIG,
/// then builds the image, optionally seeding the layer cache.
#[derive(Parser, Debug)]
#[command(name = "dockyard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOCKYARD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an image after logging into all registries
    Build(BuildArgs),

    /// List configured registries
    Registries(RegistriesArgs),

    /// Show the detected build tool version
    Version,

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Source directory used as build context
    #[arg(default_value = ".")]
    pub source: PathBuf,

    /// Dockerfile path, relative to the source directory
    #[arg(short = 'f', long, default_value = "Dockerfile")]
    pub dockerfile: PathBuf,

    /// Image tag
    #[arg(short, long)]
    pub tag: String,

    /// Image to pull and reuse as layer cache
    #[arg(long)]
    pub cache_from: Option<String>,
}

/// Arguments for the registries command
#[derive(Parser, Debug)]
pub struct RegistriesArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
