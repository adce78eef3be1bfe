use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "picobuild")]
#[command(about = "A small incremental build tool for C projects")]
#[command(version)]
pub struct Args {
    /// Build description file
    #[arg(short, long, value_name = "file", default_value = "build.pb")]
    pub file: PathBuf,

    /// Run as if started in this directory
    #[arg(short = 'C', long, value_name = "dir", default_value = ".")]
    pub directory: PathBuf,

    /// C compiler, overrides the build description
    #[arg(long, value_name = "program", env = "CC")]
    pub cc: Option<String>,

    /// Archiver for static libraries, overrides the build description
    #[arg(long, value_name = "program", env = "AR")]
    pub ar: Option<String>,

    /// Don't echo the commands being run
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a target and everything it depends on
    Build {
        /// Target to build (defaults to the only target declared)
        target: Option<String>,

        /// Rebuild everything, even if up to date
        #[arg(long)]
        force: bool,
    },

    /// Remove the outputs and objects of a target and its dependencies
    Clean {
        /// Target to clean (defaults to the only target declared)
        target: Option<String>,
    },

    /// Run a built executable
    Run {
        /// Executable target to run
        target: String,

        /// Arguments passed to the executable
        #[arg(last = true)]
        args: Vec<String>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
