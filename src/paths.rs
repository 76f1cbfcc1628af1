//! Path and file name helpers.
//!
//! Pure path manipulation, no filesystem I/O.

use std::path::{Component, Path, PathBuf};

/// The extension of `path` without the dot, or an empty string.
pub fn ext_no_delimiter(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The file name of `path` with its last extension removed.
///
/// `/site/config/_default/params.fr.toml` gives `params.fr`.
pub fn filename_no_ext(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split a name at its last dot: `params.fr` gives `("params", "fr")`,
/// `params` gives `("params", "")`.
pub fn file_and_ext_no_delimiter(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx + 1..]),
        _ => (name, ""),
    }
}

/// Resolve `path` against `base` unless it is already absolute, then
/// normalize `.` and `..` components.
pub fn abs_pathify(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize_path_components(path)
    } else {
        normalize_path_components(&base.join(path))
    }
}

/// Normalize `.` and `..` components without touching the filesystem.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => components.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else {
                    // Can't go up from root, keep the component
                    components.push(Component::ParentDir);
                }
            }
            Component::Normal(name) => components.push(Component::Normal(name)),
        }
    }

    components.iter().collect()
}
