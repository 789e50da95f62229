//! citc - provision and tear down Cluster in the Cloud HPC clusters.

mod destroy;
mod error;
mod install;

use citc_cli::{Cli, Command};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout is reserved for the operator
    // protocol ([EXECUTE]/[DRY-RUN]/[ERROR] lines and the status report).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| miette::miette!("failed to initialise logging: {e}"))?;

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Install(args) => install::run(args).await,
        Command::Destroy(args) => destroy::run(args).await,
    };

    if let Err(err) = result {
        println!("[ERROR] {err}");
        std::process::exit(1);
    }

    Ok(())
}
