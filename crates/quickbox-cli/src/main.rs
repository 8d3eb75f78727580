//! # qb — quickbox CLI
//!
//! Manages containers and image sets on a stackable CoW filesystem and
//! dispatches commands into running containers over named pipes.

#![allow(
    clippy::unnecessary_wraps,
    clippy::needless_pass_by_value,
    clippy::print_stdout,
    clippy::print_stderr
)]

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let verb = cli.command.verb();
    if let Err(err) = commands::execute(cli) {
        eprintln!("qb({verb}) error: {err:#}");
        std::process::exit(1);
    }
}
