use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gamesetup")]
#[command(version, about = "Game launch options and installer")]
pub struct Args {
    /// Settings file (default: <config dir>/gamesetup/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Walk through the installer with a simulated interpreter
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List the system options that apply on this machine
    Options {
        /// Apply this runner's overrides
        #[arg(long)]
        runner: Option<String>,

        /// Include advanced and unavailable options
        #[arg(long)]
        all: bool,

        /// Print the descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the choices of a choice option
    Choices {
        /// Option key, e.g. `resolution` or `vk_icd`
        option: String,

        #[arg(long)]
        runner: Option<String>,
    },
    /// Run the installer for a script file
    Install {
        /// JSON file with one script or an array of script versions
        script: PathBuf,

        /// Install as an update of an existing game
        #[arg(long)]
        update: bool,
    },
}
