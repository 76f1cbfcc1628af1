//! Error types for configuration resolution.

use crate::config::KeyPath;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Message for a site with no config file and no config directory.
pub const NO_CONFIG_FILE_MESSAGE: &str = "Unable to locate config file or config directory. \
     Perhaps you need to create a new site.";

/// Error kinds for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A named source file does not exist. Recoverable.
    NotFound,
    Io,
    Decode,
    Merge,
    Resolver,
    Languages,
    ModuleConfig,
    Invalid,
    Hook,
}

/// Failures of the module resolver. These carry their own context and are
/// surfaced unwrapped.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error(
        "module \"{path}\" not found; either add it as a module or store it in \"{}\"",
        themes_dir.display()
    )]
    ModuleNotFound { path: String, themes_dir: PathBuf },

    #[error("failed to load config for module \"{module}\": {source}")]
    ModuleConfig {
        module: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("failed to read module manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },
}

/// Errors from loading and resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No candidate file exists for a config name.
    #[error("{}", NO_CONFIG_FILE_MESSAGE)]
    NoConfigFile,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {message}", FileLocation::new(path, *line))]
    Decode {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("{}merge failed at \"{key}\": {message}", OptionalLocation(path.as_deref(), *line))]
    Merge {
        path: Option<PathBuf>,
        line: Option<usize>,
        key: KeyPath,
        message: String,
    },

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error("language settings: {0}")]
    Languages(String),

    #[error("invalid module configuration: {0}")]
    ModuleConfig(String),

    /// A setting that cannot be decoded into its typed form.
    #[error("invalid value at \"{key}\": {message}")]
    Invalid { key: KeyPath, message: String },

    #[error(transparent)]
    Hook(#[from] anyhow::Error),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::NoConfigFile => ErrorKind::NotFound,
            ConfigError::Io { .. } => ErrorKind::Io,
            ConfigError::Decode { .. } => ErrorKind::Decode,
            ConfigError::Merge { .. } => ErrorKind::Merge,
            ConfigError::Resolver(_) => ErrorKind::Resolver,
            ConfigError::Languages(_) => ErrorKind::Languages,
            ConfigError::ModuleConfig(_) => ErrorKind::ModuleConfig,
            ConfigError::Invalid { .. } => ErrorKind::Invalid,
            ConfigError::Hook(_) => ErrorKind::Hook,
        }
    }

    /// Whether this is the recoverable "no such config file" sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NoConfigFile)
    }

    /// The source file this error points at, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } | ConfigError::Decode { path, .. } => Some(path),
            ConfigError::Merge { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    /// The 1-based line this error points at, if derivable.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfigError::Decode { line, .. } | ConfigError::Merge { line, .. } => *line,
            _ => None,
        }
    }
}

struct FileLocation<'a> {
    path: &'a Path,
    line: Option<usize>,
}

impl<'a> FileLocation<'a> {
    fn new(path: &'a Path, line: Option<usize>) -> Self {
        Self { path, line }
    }
}

impl fmt::Display for FileLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "\"{}:{}\"", self.path.display(), line),
            None => write!(f, "\"{}\"", self.path.display()),
        }
    }
}

struct OptionalLocation<'a>(Option<&'a Path>, Option<usize>);

impl fmt::Display for OptionalLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(path) => write!(f, "{}: ", FileLocation::new(path, self.1)),
            None => Ok(()),
        }
    }
}
