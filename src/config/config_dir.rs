//! Merging the config directory: `_default/` first, then the environment.
//!
//! Each file's base name decides where its content lands:
//! - `config.toml` merges at the root
//! - `params.toml` merges under `params`
//! - `params.fr.toml` merges under `languages.fr.params`
//! - `menu.fr.toml` / `menus.fr.toml` merge under `languages.fr.menus`
//! - any other `<key>.<lang>` merges under `languages.<lang>`

use super::decode::is_valid_config_filename;
use super::key_path::KeyPath;
use super::loader::ConfigLoader;
use super::rename::KeyRenamer;
use super::store::ConfigStore;
use crate::error::ConfigError;
use crate::paths::{file_and_ext_no_delimiter, filename_no_ext};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, info};

/// Name of the lowest-precedence subdirectory of the config directory.
pub const DEFAULT_CONFIG_SUBDIR: &str = "_default";

/// Outcome of merging the config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDirMerge {
    /// Every directory visited, for change watching.
    pub dirs: Vec<PathBuf>,
    /// Every file that was decoded and merged.
    pub files: Vec<PathBuf>,
    /// Directories and merged files together, in walk order.
    pub visited: Vec<PathBuf>,
}

/// Where a config directory file with this base name (extension removed)
/// is merged.
pub fn derive_key_path(base_name: &str) -> KeyPath {
    if base_name.eq_ignore_ascii_case("config") {
        return KeyPath::root();
    }

    let (name, lang) = file_and_ext_no_delimiter(base_name);
    if lang.is_empty() {
        return KeyPath::new([name]);
    }

    let path = KeyPath::new(["languages", lang]);
    match name.to_lowercase().as_str() {
        "menu" | "menus" => path.child("menus"),
        "params" => path.child("params"),
        _ => path,
    }
}

/// Nest `item` under `key_path`.
fn nest(key_path: &KeyPath, item: Map<String, Value>) -> Map<String, Value> {
    let mut root = item;
    for segment in key_path.segments().iter().rev() {
        let mut parent = Map::new();
        parent.insert(segment.clone(), Value::Object(root));
        root = parent;
    }
    root
}

impl ConfigLoader<'_> {
    /// Merge `_default/` and then `<environment>/` from the config directory.
    ///
    /// A missing config directory (or missing subdirectories) is not an
    /// error. Any decode or merge failure aborts with file context.
    pub fn load_config_from_config_dir(
        &self,
        store: &mut ConfigStore,
    ) -> Result<ConfigDirMerge, ConfigError> {
        let fs = self.fs();
        let mut result = ConfigDirMerge::default();

        let Some(config_dir) = self.descriptor.abs_config_dir.as_deref() else {
            return Ok(result);
        };
        if !fs.is_dir(config_dir) {
            debug!("Config directory {} does not exist", config_dir.display());
            return Ok(result);
        }

        let default_dir = config_dir.join(DEFAULT_CONFIG_SUBDIR);
        let environment_dir = config_dir.join(&self.descriptor.environment);

        // Merge from least to most specific.
        let tiers: Vec<PathBuf> = [default_dir, environment_dir]
            .into_iter()
            .filter(|dir| fs.is_dir(dir))
            .collect();

        let renamer = KeyRenamer::legacy();

        for tier in tiers {
            let entries = fs.walk(&tier).map_err(|source| ConfigError::Io {
                path: tier.clone(),
                source,
            })?;

            for entry in entries {
                if entry.is_dir {
                    debug!("Visiting config directory {}", entry.path.display());
                    result.visited.push(entry.path.clone());
                    result.dirs.push(entry.path);
                    continue;
                }
                if !is_valid_config_filename(&entry.path) {
                    continue;
                }

                let item = self.decode_file_raw(&entry.path)?;
                let key_path = derive_key_path(&filename_no_ext(&entry.path));
                let mut root = nest(&key_path, item);

                // Migrate menu => menus etc.
                renamer.rename(&mut root);

                store
                    .merge_config_map(root)
                    .map_err(|conflict| self.wrap_merge_error(conflict, &entry.path))?;

                info!(
                    "Merged {} at \"{}\"",
                    entry.path.display(),
                    if key_path.is_root() {
                        "<root>".to_string()
                    } else {
                        key_path.to_string()
                    }
                );
                result.visited.push(entry.path.clone());
                result.files.push(entry.path);
            }
        }

        Ok(result)
    }
}
