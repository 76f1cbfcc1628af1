//! Site configuration resolution.
//!
//! Resolves the build configuration of a static site from its config files,
//! config directory, themes and built-in defaults.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod logging;
pub mod paths;
