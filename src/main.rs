//! Myrmidon CLI - host, join, or run a local-loopback match.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Myrmidon - a deterministic lockstep ant-colony RTS engine
#[derive(Parser, Debug)]
#[command(name = "myrmidon")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind a port and wait for a joiner, then play as player 0
    Host {
        /// Port to listen on
        #[arg(short, long, default_value = "7777")]
        port: u16,
    },

    /// Connect to a hosted match and play as player 1
    Join {
        /// Address to connect to, e.g. `127.0.0.1:7777`
        #[arg(required = true)]
        addr: String,
    },

    /// Run both players in one process over real loopback sockets
    Local,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).init();

    let result = match args.command {
        Commands::Host { port } => cli::host::execute(port),
        Commands::Join { addr } => cli::join::execute(&addr),
        Commands::Local => cli::local::execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
