//! Source description and primary config file loading.

use super::decode::{ConfigDecoder, decode_file_to_map};
use super::defaults::ENVIRONMENT_PRODUCTION;
use super::locator::locate_config_file;
use super::merge::MergeConflict;
use super::rename::KeyRenamer;
use super::store::{ConfigStore, EnvOverrides};
use crate::error::ConfigError;
use crate::fs::SourceFs;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default prefix for environment variable overrides.
pub const DEFAULT_ENV_PREFIX: &str = "SITE";

/// Default config base name when no file name is given.
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Where to find the configuration for one build.
#[derive(Debug, Clone)]
pub struct ConfigSourceDescriptor {
    pub fs: Arc<dyn SourceFs>,

    /// Config file name(s), comma-separated, e.g. `config.toml,extra.toml`.
    /// Empty means [`DEFAULT_CONFIG_NAME`].
    pub filename: String,

    /// Directory to look for config files in. Falls back to `working_dir`.
    pub path: Option<PathBuf>,

    /// The project's working directory.
    pub working_dir: PathBuf,

    /// Optional directory holding `_default/` and per-environment overrides.
    pub abs_config_dir: Option<PathBuf>,

    /// production, development
    pub environment: String,

    /// Prefix for environment variable overrides.
    pub env_prefix: String,

    /// Snapshot of environment variables consulted for overrides.
    pub env_vars: BTreeMap<String, String>,
}

impl ConfigSourceDescriptor {
    pub fn new(fs: Arc<dyn SourceFs>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            filename: String::new(),
            path: None,
            working_dir: working_dir.into(),
            abs_config_dir: None,
            environment: ENVIRONMENT_PRODUCTION.to_string(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_vars: BTreeMap::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.abs_config_dir = Some(dir.into());
        self
    }

    /// Set the environment label. Empty means production.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        let environment = environment.into();
        self.environment = if environment.trim().is_empty() {
            ENVIRONMENT_PRODUCTION.to_string()
        } else {
            environment
        };
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Capture the variables of the running process that carry the prefix.
    pub fn with_process_env(self) -> Self {
        let prefix = format!("{}_", self.env_prefix.to_uppercase());
        let vars: Vec<(String, String)> = std::env::vars()
            .filter(|(k, _)| k.to_uppercase().starts_with(&prefix))
            .collect();
        self.with_env_vars(vars)
    }

    /// The config base names to load, in order.
    pub fn config_filenames(&self) -> Vec<String> {
        let names: Vec<String> = self
            .filename
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            vec![DEFAULT_CONFIG_NAME.to_string()]
        } else {
            names
        }
    }

    /// Directory to resolve relative config file names against.
    pub fn config_file_dir(&self) -> &Path {
        self.path.as_deref().unwrap_or(&self.working_dir)
    }

    pub(crate) fn env_overrides(&self) -> EnvOverrides {
        EnvOverrides::new(&self.env_prefix, self.env_vars.clone())
    }
}

/// Loads config sources described by a [`ConfigSourceDescriptor`] into a
/// [`ConfigStore`].
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader<'a> {
    pub(crate) descriptor: &'a ConfigSourceDescriptor,
    pub(crate) decoder: &'a dyn ConfigDecoder,
}

impl<'a> ConfigLoader<'a> {
    pub fn new(descriptor: &'a ConfigSourceDescriptor, decoder: &'a dyn ConfigDecoder) -> Self {
        Self {
            descriptor,
            decoder,
        }
    }

    pub(crate) fn fs(&self) -> &'a dyn SourceFs {
        self.descriptor.fs.as_ref()
    }

    /// Decode a file and lower-case its keys.
    ///
    /// Legacy renames are left to the caller, since they only hold once the
    /// tree sits at the config root.
    pub(crate) fn decode_file_raw(&self, path: &Path) -> Result<Map<String, Value>, ConfigError> {
        let map = decode_file_to_map(self.fs(), self.decoder, path)?;
        Ok(super::merge::lowercase_keys(map))
    }

    /// Decode a root-level file, lower-case its keys and apply legacy renames.
    pub(crate) fn decode_file(&self, path: &Path) -> Result<Map<String, Value>, ConfigError> {
        let mut map = self.decode_file_raw(path)?;
        KeyRenamer::legacy().rename(&mut map);
        Ok(map)
    }

    /// Locate, decode and overlay-merge one named config file.
    ///
    /// Returns the file path, or [`ConfigError::NoConfigFile`] when no
    /// candidate exists.
    pub fn load_config(&self, name: &str, store: &mut ConfigStore) -> Result<PathBuf, ConfigError> {
        let filename = locate_config_file(self.fs(), name, self.descriptor.config_file_dir())?;
        let map = self.decode_file(&filename)?;
        store
            .merge_config_map(map)
            .map_err(|conflict| self.wrap_merge_error(conflict, &filename))?;
        info!("Loaded config file {}", filename.display());
        Ok(filename)
    }

    /// Load every configured name in order. Names without a file are
    /// skipped; the caller decides whether finding none is fatal.
    pub fn load_config_files(&self, store: &mut ConfigStore) -> Result<Vec<PathBuf>, ConfigError> {
        let mut loaded = Vec::new();
        for name in self.descriptor.config_filenames() {
            match self.load_config(&name, store) {
                Ok(filename) => loaded.push(filename),
                Err(err) if err.is_not_found() => {
                    debug!(
                        "No config file for \"{}\" in {}",
                        name,
                        self.descriptor.config_file_dir().display()
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(loaded)
    }

    /// Attach file context to a merge conflict, with a best-effort line.
    pub(crate) fn wrap_merge_error(&self, conflict: MergeConflict, path: &Path) -> ConfigError {
        let line = conflict.key.last().and_then(|key| {
            let source = self.fs().read(path).ok()?;
            find_key_line(&String::from_utf8_lossy(&source), key)
        });
        ConfigError::Merge {
            path: Some(path.to_path_buf()),
            line,
            message: conflict.to_string(),
            key: conflict.key,
        }
    }
}

/// 1-based line of the first line mentioning `key` as a whole word.
pub(crate) fn find_key_line(source: &str, key: &str) -> Option<usize> {
    let re = Regex::new(&format!(r"(?i)\b{}\b", regex_lite::escape(key))).ok()?;
    source
        .lines()
        .position(|line| re.is_match(line))
        .map(|idx| idx + 1)
}
