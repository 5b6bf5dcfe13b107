//! The file-system boundary. The compiler core never touches the disk
//! directly; the pipeline writes its artifacts through a [`FileSystem`].

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read-only file system: {}", .0.display())]
    ReadOnly(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn io(path: &Path, source: io::Error) -> FsError {
        if source.kind() == io::ErrorKind::NotFound {
            FsError::NotFound(path.to_owned())
        } else {
            FsError::Io {
                path: path.to_owned(),
                source,
            }
        }
    }
}

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and all of its missing parents.
    fn create_directory(&self, path: &Path) -> Result<(), FsError>;

    /// Creates or truncates `path`. The parent directory must exist.
    fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError>;

    fn read_file(&self, path: &Path) -> Result<String, FsError>;

    /// Joins a `/`-separated artifact key onto `base`.
    fn join(&self, base: &Path, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(base.to_owned(), |path, segment| path.join(segment))
    }
}

/// The real disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFileSystem;

impl FileSystem for NativeFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_directory(&self, path: &Path) -> Result<(), FsError> {
        std::fs::create_dir_all(path).map_err(|e| FsError::io(path, e))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        std::fs::write(path, contents).map_err(|e| FsError::io(path, e))
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        std::fs::read_to_string(path).map_err(|e| FsError::io(path, e))
    }
}

#[derive(Debug, Default)]
struct Tree {
    directories: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, String>,
}

/// An in-memory tree, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    tree: Mutex<Tree>,
    read_only: bool,
}

impl MemoryFileSystem {
    pub fn new() -> MemoryFileSystem {
        MemoryFileSystem::default()
    }

    /// A file system rejecting every write.
    pub fn read_only() -> MemoryFileSystem {
        MemoryFileSystem {
            tree: Mutex::default(),
            read_only: true,
        }
    }

    /// Every file written so far, sorted by path.
    pub fn files(&self) -> Vec<(PathBuf, String)> {
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.files
            .iter()
            .map(|(path, contents)| (path.clone(), contents.clone()))
            .collect()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.files.contains_key(path) || tree.directories.contains(path)
    }

    fn create_directory(&self, path: &Path) -> Result<(), FsError> {
        if self.read_only {
            return Err(FsError::ReadOnly(path.to_owned()));
        }
        let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                tree.directories.insert(ancestor.to_owned());
            }
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        if self.read_only {
            return Err(FsError::ReadOnly(path.to_owned()));
        }
        let mut tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent {
            if !tree.directories.contains(parent) {
                return Err(FsError::NotFound(parent.to_owned()));
            }
        }
        tree.files.insert(path.to_owned(), contents.to_owned());
        Ok(())
    }

    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        let tree = self.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.files
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn memory_round_trip() {
        let fs = MemoryFileSystem::new();
        let dir = Path::new("out/assembly");
        fs.create_directory(dir).unwrap();
        assert!(fs.exists(Path::new("out")));

        let file = fs.join(Path::new("out"), "assembly/main.ts");
        assert_eq!(file, Path::new("out").join("assembly").join("main.ts"));
        fs.write_file(&file, "export {}").unwrap();
        assert_eq!(fs.read_file(&file).unwrap(), "export {}");
        assert_eq!(fs.files().len(), 1);
    }

    #[test]
    fn memory_requires_parent_directory() {
        let fs = MemoryFileSystem::new();
        let error = fs.write_file(Path::new("missing/a.ts"), "").unwrap_err();
        assert_eq!(error.to_string(), "no such file or directory: missing");
    }

    #[test]
    fn read_only_rejects_writes() {
        let fs = MemoryFileSystem::read_only();
        assert!(matches!(
            fs.create_directory(Path::new("out")),
            Err(FsError::ReadOnly(_))
        ));
    }

    #[test]
    fn native_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = NativeFileSystem;
        let nested = fs.join(dir.path(), "a/b");
        fs.create_directory(&nested).unwrap();
        let file = nested.join("c.txt");
        fs.write_file(&file, "hello").unwrap();
        assert!(fs.exists(&file));
        assert_eq!(fs.read_file(&file).unwrap(), "hello");
        assert!(matches!(
            fs.read_file(&nested.join("nope")),
            Err(FsError::NotFound(_))
        ));
    }
}
