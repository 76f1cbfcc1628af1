//! Subcommand implementations. Each returns the text to print.

use super::{Cli, Command, FormatArgs, ShowArgs};
use crate::config::{ConfigResolver, KeyPath, ResolvedConfig};
use crate::format::render;
use crate::fs::SourceFs;
use anyhow::{Result, bail};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Resolve the configuration described by `cli` and run its subcommand.
pub fn run(cli: &Cli, fs: Arc<dyn SourceFs>, working_dir: &Path) -> Result<String> {
    let descriptor = cli
        .descriptor(fs, working_dir)
        .with_process_env();
    debug!(
        "Resolving configuration in {} ({})",
        descriptor.working_dir.display(),
        descriptor.environment
    );

    let resolved = ConfigResolver::default()
        .resolve(&descriptor, &[])?
        .require_project_config()?;

    match &cli.command {
        None => show(&resolved, &ShowArgs::default()),
        Some(Command::Show(args)) => show(&resolved, args),
        Some(Command::Files) => Ok(files(&resolved)),
        Some(Command::Modules(args)) => modules(&resolved, args),
        Some(Command::Languages(args)) => languages(&resolved, args),
    }
}

fn show(resolved: &ResolvedConfig, args: &ShowArgs) -> Result<String> {
    let value = match &args.key {
        None => resolved.store.all_settings(),
        Some(key) => match resolved.store.get(&KeyPath::parse(key)) {
            Some(value) => value,
            None => bail!("Key '{}' is not set", key),
        },
    };
    render(&value, args.format)
}

fn files(resolved: &ResolvedConfig) -> String {
    resolved
        .files
        .iter()
        .map(|path| format!("{}\n", path.display()))
        .collect()
}

fn modules(resolved: &ResolvedConfig, args: &FormatArgs) -> Result<String> {
    let modules = serde_json::to_value(resolved.store.all_modules())?;
    render(&json!({ "modules": modules }), args.format)
}

fn languages(resolved: &ResolvedConfig, args: &FormatArgs) -> Result<String> {
    let languages = serde_json::to_value(resolved.store.languages())?;
    render(&json!({ "languages": languages }), args.format)
}
