//! CLI command definitions for site-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod commands;

use crate::config::{ConfigSourceDescriptor, DEFAULT_ENV_PREFIX};
use crate::format::OutputFormat;
use crate::fs::SourceFs;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under the source holding `_default/` and environment overrides.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Resolve and inspect static site configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site source directory (default: current directory)
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// Config file name(s), comma-separated
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Config directory (default: <source>/config)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Build environment: production (default), development, ...
    #[arg(short, long, global = true)]
    pub environment: Option<String>,

    /// Prefix of environment variables overriding settings
    #[arg(long, default_value = DEFAULT_ENV_PREFIX, global = true)]
    pub env_prefix: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration (default if no subcommand given)
    Show(ShowArgs),

    /// List every file and directory that took part, for change watching
    Files,

    /// List the resolved module chain, project last
    Modules(FormatArgs),

    /// List the configured languages in display order
    Languages(FormatArgs),
}

/// Arguments for the show subcommand
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Output format: json (default), yaml, or toml
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Only print the value at this dot-separated key, e.g. params.author
    #[arg(short, long, value_name = "KEY")]
    pub key: Option<String>,
}

/// Output format selection shared by listing subcommands
#[derive(Args, Debug, Default)]
pub struct FormatArgs {
    /// Output format: json (default), yaml, or toml
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,
}

impl Cli {
    /// Build the source descriptor for these options. `working_dir` is used
    /// when no `--source` is given.
    pub fn descriptor(&self, fs: Arc<dyn SourceFs>, working_dir: &Path) -> ConfigSourceDescriptor {
        let source = match &self.source {
            Some(source) => crate::paths::abs_pathify(working_dir, source),
            None => working_dir.to_path_buf(),
        };
        let config_dir = match &self.config_dir {
            Some(dir) => crate::paths::abs_pathify(&source, dir),
            None => source.join(DEFAULT_CONFIG_DIR),
        };

        let mut descriptor = ConfigSourceDescriptor::new(fs, source)
            .with_config_dir(config_dir)
            .with_env_prefix(self.env_prefix.as_str());
        if let Some(config) = &self.config {
            descriptor = descriptor.with_filename(config.as_str());
        }
        if let Some(environment) = &self.environment {
            descriptor = descriptor.with_environment(environment.as_str());
        }
        descriptor
    }
}
