//! Filesystem access for config sources.
//!
//! All existence checks, reads and directory walks in the resolver go through
//! [`SourceFs`], so resolution can run against the real filesystem or an
//! in-memory tree.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One entry produced by [`SourceFs::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Filesystem operations needed to locate and read config sources.
pub trait SourceFs: Send + Sync + fmt::Debug {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Every entry under `root`, root included, pre-order with siblings
    /// sorted by name.
    fn walk(&self, root: &Path) -> io::Result<Vec<WalkEntry>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl SourceFs for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn walk(&self, root: &Path) -> io::Result<Vec<WalkEntry>> {
        if !root.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", root.display()),
            ));
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            match entry {
                Ok(entry) => entries.push(WalkEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                }),
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                }
            }
        }
        Ok(entries)
    }
}

/// An in-memory filesystem. Parent directories of added files exist
/// implicitly.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Builder form of [`MemFs::add_file`].
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, content);
        self
    }

    /// Add an (empty) directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.dirs.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }
    }
}

impl SourceFs for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
        })
    }

    fn walk(&self, root: &Path) -> io::Result<Vec<WalkEntry>> {
        if !self.exists(root) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", root.display()),
            ));
        }
        // Path ordering is component-wise, so a sorted merge of both sets is
        // already a pre-order traversal.
        let mut entries: BTreeMap<&Path, bool> = BTreeMap::new();
        for dir in self.dirs.iter().filter(|d| d.starts_with(root)) {
            entries.insert(dir, true);
        }
        for file in self.files.keys().filter(|f| f.starts_with(root)) {
            entries.insert(file, false);
        }
        Ok(entries
            .into_iter()
            .map(|(path, is_dir)| WalkEntry {
                path: path.to_path_buf(),
                is_dir,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memfs_parents_exist() {
        let fs = MemFs::new().with_file("/site/config/_default/params.toml", "a = 1");
        assert!(fs.is_dir(Path::new("/site/config/_default")));
        assert!(fs.is_dir(Path::new("/site")));
        assert!(fs.exists(Path::new("/site/config/_default/params.toml")));
        assert!(!fs.is_dir(Path::new("/site/config/_default/params.toml")));
    }

    #[test]
    fn test_memfs_walk_is_preorder() {
        let fs = MemFs::new()
            .with_file("/c/b.toml", "")
            .with_file("/c/a/x.toml", "")
            .with_file("/other/y.toml", "");
        let paths: Vec<_> = fs
            .walk(Path::new("/c"))
            .unwrap()
            .into_iter()
            .map(|e| (e.path.to_string_lossy().into_owned(), e.is_dir))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("/c".to_string(), true),
                ("/c/a".to_string(), true),
                ("/c/a/x.toml".to_string(), false),
                ("/c/b.toml".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_memfs_walk_missing_root() {
        let fs = MemFs::new();
        assert!(fs.walk(Path::new("/nope")).is_err());
    }

    #[test]
    fn test_osfs_walk_sorted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("config");
        std::fs::create_dir_all(root.join("_default")).unwrap();
        std::fs::write(root.join("_default/params.toml"), "a = 1").unwrap();
        std::fs::write(root.join("_default/menus.toml"), "").unwrap();

        let entries = OsFs.walk(&root).unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|e| e.path.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["", "_default", "_default/menus.toml", "_default/params.toml"]);
        assert!(entries[0].is_dir);
        assert!(!entries[2].is_dir);
    }
}
