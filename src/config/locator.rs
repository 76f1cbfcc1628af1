//! Locating a config file from a base name or path.

use super::decode::{Format, VALID_CONFIG_EXTENSIONS};
use crate::error::ConfigError;
use crate::fs::SourceFs;
use std::path::{Path, PathBuf};

/// Find the config file for `name` in `search_dir`.
///
/// A name with a recognized extension is checked literally. Otherwise each
/// extension in [`VALID_CONFIG_EXTENSIONS`] is appended in order and the first
/// existing candidate wins. Absolute names ignore `search_dir`.
///
/// Returns [`ConfigError::NoConfigFile`] when nothing matches.
pub fn locate_config_file(
    fs: &dyn SourceFs,
    name: &str,
    search_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::NoConfigFile);
    }

    let base = Path::new(name);
    let base = if base.is_absolute() {
        base.to_path_buf()
    } else {
        search_dir.join(base)
    };

    if Format::from_path(&base).is_some() {
        return if fs.exists(&base) && !fs.is_dir(&base) {
            Ok(base)
        } else {
            Err(ConfigError::NoConfigFile)
        };
    }

    for ext in VALID_CONFIG_EXTENSIONS {
        let mut candidate = base.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if fs.exists(&candidate) && !fs.is_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ConfigError::NoConfigFile)
}
