//! Drydock CLI - container-friendly CMake build orchestrator

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use drydock::core::config::SourceRootMissing;

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("drydock=debug")
    } else {
        EnvFilter::new("drydock=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        // A missing source root is a precondition failure with its own
        // exit code; everything else is a command failure.
        let code = if e.downcast_ref::<SourceRootMissing>().is_some() {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.detect_gpu_only() {
        return drydock::ops::detect_gpu::run();
    }

    let config = cli.into_config();
    drydock::ops::build::run(&config)
}
