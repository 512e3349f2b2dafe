//! Command-line argument handling for `pkgsolve`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// The command-line interface for the `pkgsolve` dependency resolver demo.
#[derive(Debug, Parser)]
#[command(about = "Resolve package dependencies against a JSON index.", author, name = "pkgsolve", version)]
pub struct Cli {
    /// Log verbosity level.
    #[command(flatten)]
    pub verbose: clap_verbosity::Verbosity,

    /// The `pkgsolve` commands.
    #[command(subcommand)]
    pub command: Command,
}

/// The `pkgsolve` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve one or more match specs into a consistent set of artifacts.
    Solve {
        /// Path to a JSON index file (spec.md §6 "Index format").
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Match spec strings to resolve, e.g. `"numpy >=1.7,<1.8"`.
        #[arg(value_name = "SPEC")]
        specs: Vec<String>,

        /// Requested feature tag, repeatable.
        #[arg(long = "feature", value_name = "FEATURE")]
        features: Vec<String>,

        /// Restrict candidates to each package's newest (version, build
        /// number) before solving.
        #[arg(long)]
        max_only: bool,

        /// Path to a JSON object mapping package name to an already
        /// installed filename, used as the objective's zero point.
        #[arg(long, value_name = "FILE")]
        installed: Option<PathBuf>,
    },

    /// List the artifacts in an index matching a single spec.
    FindMatches {
        /// Path to a JSON index file (spec.md §6 "Index format").
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// The match spec string to evaluate.
        #[arg(value_name = "SPEC")]
        spec: String,
    },
}
