//! The `pkgsolve` CLI tool.

use std::process::ExitCode;

use clap::Parser;
use simplelog::{ColorChoice, Config, TermLogger};

mod cli;
mod commands;
mod error;

use cli::{Cli, Command};
use commands::{find_matches, solve};
pub use error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = TermLogger::init(
        cli.verbose.log_level_filter(),
        Config::default(),
        simplelog::TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("failed to initialize logger:\n{error}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Command::Solve { index, specs, features, max_only, installed } => solve(index, specs, features, max_only, installed),
        Command::FindMatches { index, spec } => find_matches(index, spec),
    };

    if let Err(error) = result {
        eprintln!("{error}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
