//! Filesystem access for content-reading checks

use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};

use crate::filter::FileSet;

/// Read-only view of the source tree
pub trait FileSystem: Send + Sync {
    /// Every file under `root`, as paths relative to the tree root
    fn list_files(&self, root: &Path) -> io::Result<FileSet>;

    /// Like [`FileSystem::list_files`], but ignore files are not applied,
    /// so generated or gitignored files are listed too
    fn list_all_files(&self, root: &Path) -> io::Result<FileSet>;

    /// Raw file contents
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`FileSystem`] over a directory on disk.
///
/// Relative paths resolve against the tree root. Listing includes dotfiles
/// and never descends into `.git`; only `list_files` honours
/// `.gitignore`/`.ignore` files.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl LocalFs {
    fn walk(&self, root: &Path, respect_ignores: bool) -> io::Result<FileSet> {
        let dir = self.resolve(root);
        if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let walker = WalkBuilder::new(&dir)
            .standard_filters(respect_ignores)
            .hidden(false)
            .require_git(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut files = FileSet::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        let path = entry.path();
                        let relative = path.strip_prefix(&self.root).unwrap_or(path);
                        files.insert(relative.to_path_buf());
                    }
                }
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }

        tracing::debug!("Listed {} files under {}", files.len(), dir.display());
        Ok(files)
    }
}

impl FileSystem for LocalFs {
    fn list_files(&self, root: &Path) -> io::Result<FileSet> {
        self.walk(root, true)
    }

    fn list_all_files(&self, root: &Path) -> io::Result<FileSet> {
        self.walk(root, false)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }
}
