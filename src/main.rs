//! site-config
//!
//! Resolves a static site's layered configuration and prints it.

use anyhow::Result;
use clap::Parser;
use site_config::cli::{Cli, commands};
use site_config::fs::OsFs;
use site_config::logging::init_logging;
use std::io::Write;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    init_logging(cli.verbose, &cli.log)?;

    let working_dir = std::env::current_dir()?;
    let output = commands::run(&cli, Arc::new(OsFs), &working_dir)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(output.as_bytes())?;
    out.flush()?;
    Ok(())
}
