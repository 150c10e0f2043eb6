//! # sovpool CLI entry point
//!
//! Parses arguments and dispatches to the subcommand handlers. The exit
//! code is the handler's verdict, or 1 on error.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sovpool_cli::evidence::{run_evidence, EvidenceArgs};
use sovpool_cli::merkle::{run_prove, run_root, run_verify, ProveArgs, RootArgs, VerifyArgs};

/// Offline verifier for sealed signature pools.
#[derive(Parser, Debug)]
#[command(name = "sovpool", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute the Merkle root over a leaf file.
    Root(RootArgs),

    /// Build an inclusion proof for one leaf.
    Prove(ProveArgs),

    /// Verify an inclusion proof; exit 0 iff valid.
    Verify(VerifyArgs),

    /// Derive an evidence hash for a voter and content.
    Evidence(EvidenceArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Root(args) => run_root(&args),
        Commands::Prove(args) => run_prove(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Evidence(args) => run_evidence(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
