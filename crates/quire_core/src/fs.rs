//! Filesystem abstraction.
//!
//! Every operation in the core that touches disk goes through the
//! [`FileSystem`] trait, so the same code runs against the real filesystem
//! ([`RealFileSystem`]) and against [`InMemoryFileSystem`] in tests.

use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations
pub trait FileSystem {
    /// Reads a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Writes (creating or overwriting) a file
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Writes a file so readers never observe a half-written state.
    ///
    /// The default falls back to a plain write.
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        self.write_file(path, content)
    }

    /// Deletes a file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Checks if a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Creates a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move/rename a file from `from` to `to`.
    ///
    /// Errors if the source does not exist or if the destination already exists.
    /// Parent directories of the destination are created.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copies a file, creating the destination's parent directories.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self.read_to_string(from)?;
        if let Some(parent) = to.parent()
            && !parent.as_os_str().is_empty()
        {
            self.create_dir_all(parent)?;
        }
        self.write_file(to, &content)
    }

    /// Lists the direct children (files and directories) of a directory
    fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Removes an empty directory. Errors if it still has children.
    fn remove_dir(&self, path: &Path) -> Result<()>;
}

// Blanket implementation for references to FileSystem
impl<T: FileSystem> FileSystem for &T {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        (*self).read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file(path, content)
    }

    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        (*self).write_file_atomic(path, content)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (*self).delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (*self).exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (*self).is_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        (*self).create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        (*self).move_file(from, to)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        (*self).copy_file(from, to)
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (*self).list_entries(dir)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        (*self).remove_dir(path)
    }
}

/// Recursively collects every file below `dir`.
pub fn list_files_recursive<FS: FileSystem>(fs: &FS, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs.list_entries(&current)? {
            if fs.is_dir(&entry) {
                pending.push(entry);
            } else {
                files.push(entry);
            }
        }
    }
    files.sort();
    Ok(files)
}

// ============================================================================
// RealFileSystem - Only available on non-WASM targets
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
use std::fs;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
/// This is a simple filesystem implementation that simply maps to std::fs methods
pub struct RealFileSystem;

#[cfg(not(target_arch = "wasm32"))]
impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::write(path, content)
    }

    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, content)?;
        // rename replaces the destination in one step on every platform we target
        fs::rename(&staging, path).inspect_err(|_| {
            let _ = fs::remove_file(&staging);
        })
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        if !from.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Source file not found: {:?}", from),
            ));
        }
        if to.exists() {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("Destination already exists: {:?}", to),
            ));
        }

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::rename(from, to)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to).map(|_| ())
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                entries.push(entry?.path());
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path)
    }
}

// ============================================================================
// InMemoryFileSystem - Available on all targets
// ============================================================================

use std::collections::{HashMap, HashSet};
use std::path::Component;
use std::sync::{Arc, RwLock};

/// An in-memory filesystem implementation.
///
/// Clones share the same storage, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    /// Files stored as path -> content
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
    /// Directories that exist (implicitly created when files are added)
    directories: Arc<RwLock<HashSet<PathBuf>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a sorted list of all file paths in the filesystem
    pub fn list_all_files(&self) -> Vec<PathBuf> {
        let files = self.files.read().unwrap();
        let mut paths: Vec<PathBuf> = files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Helper to normalize paths (remove . and .. components where possible)
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    components.pop();
                }
                c => components.push(c),
            }
        }
        components.iter().collect()
    }

    fn insert_parents(dirs: &mut HashSet<PathBuf>, path: &Path) {
        let mut current = path;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() {
                dirs.insert(parent.to_path_buf());
            }
            current = parent;
        }
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap();
        files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let normalized = Self::normalize_path(path);
        {
            let mut dirs = self.directories.write().unwrap();
            Self::insert_parents(&mut dirs, &normalized);
        }
        let mut files = self.files.write().unwrap();
        files.insert(normalized, content.to_string());
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut files = self.files.write().unwrap();
        files
            .remove(&normalized)
            .map(|_| ())
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("File not found: {:?}", path)))
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let files = self.files.read().unwrap();
        let dirs = self.directories.read().unwrap();
        files.contains_key(&normalized) || dirs.contains(&normalized)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = Self::normalize_path(path);
        let dirs = self.directories.read().unwrap();
        dirs.contains(&normalized)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        let mut dirs = self.directories.write().unwrap();
        Self::insert_parents(&mut dirs, &normalized);
        if !normalized.as_os_str().is_empty() {
            dirs.insert(normalized);
        }
        Ok(())
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        let from_norm = Self::normalize_path(from);
        let to_norm = Self::normalize_path(to);

        if from_norm == to_norm {
            return Ok(());
        }

        // Validate existence and destination availability up-front.
        {
            let files = self.files.read().unwrap();
            if !files.contains_key(&from_norm) {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("Source file not found: {:?}", from),
                ));
            }
            if files.contains_key(&to_norm) {
                return Err(Error::new(
                    ErrorKind::AlreadyExists,
                    format!("Destination already exists: {:?}", to),
                ));
            }
        }

        {
            let mut dirs = self.directories.write().unwrap();
            Self::insert_parents(&mut dirs, &to_norm);
        }

        let mut files = self.files.write().unwrap();
        let content = files.remove(&from_norm).ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Source file not found: {:?}", from),
            )
        })?;
        files.insert(to_norm, content);
        Ok(())
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let normalized = Self::normalize_path(dir);
        let files = self.files.read().unwrap();
        let dirs = self.directories.read().unwrap();

        let mut result: Vec<PathBuf> = files
            .keys()
            .chain(dirs.iter())
            .filter(|path| path.parent() == Some(normalized.as_path()))
            .cloned()
            .collect();
        result.sort();
        result.dedup();
        Ok(result)
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let normalized = Self::normalize_path(path);
        if !self.is_dir(&normalized) {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("Directory not found: {:?}", path),
            ));
        }
        if !self.list_entries(&normalized)?.is_empty() {
            return Err(Error::new(
                ErrorKind::DirectoryNotEmpty,
                format!("Directory not empty: {:?}", path),
            ));
        }
        let mut dirs = self.directories.write().unwrap();
        dirs.remove(&normalized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_fs_basic_operations() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("test.md"), "Hello, World!").unwrap();
        assert_eq!(
            fs.read_to_string(Path::new("test.md")).unwrap(),
            "Hello, World!"
        );

        assert!(fs.exists(Path::new("test.md")));
        assert!(!fs.exists(Path::new("nonexistent.md")));

        fs.delete_file(Path::new("test.md")).unwrap();
        assert!(!fs.exists(Path::new("test.md")));
    }

    #[test]
    fn test_in_memory_fs_directories() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("a/b/c/file.md"), "Content").unwrap();

        assert!(fs.is_dir(Path::new("a")));
        assert!(fs.is_dir(Path::new("a/b")));
        assert!(fs.is_dir(Path::new("a/b/c")));
        assert!(fs.exists(Path::new("a/b/c/file.md")));
    }

    #[test]
    fn test_in_memory_fs_move_refuses_existing_destination() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("a.md"), "A").unwrap();
        fs.write_file(Path::new("b.md"), "B").unwrap();

        let err = fs
            .move_file(Path::new("a.md"), Path::new("b.md"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        fs.move_file(Path::new("a.md"), Path::new("dir/a.md"))
            .unwrap();
        assert!(!fs.exists(Path::new("a.md")));
        assert_eq!(fs.read_to_string(Path::new("dir/a.md")).unwrap(), "A");
    }

    #[test]
    fn test_in_memory_fs_list_and_remove_dir() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("dir/file1.md"), "1").unwrap();
        fs.write_file(Path::new("dir/sub/file2.md"), "2").unwrap();

        let entries = fs.list_entries(Path::new("dir")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("dir/file1.md"), PathBuf::from("dir/sub")]
        );

        let all = list_files_recursive(&fs, Path::new("dir")).unwrap();
        assert_eq!(all.len(), 2);

        // Not empty yet
        assert!(fs.remove_dir(Path::new("dir/sub")).is_err());

        fs.delete_file(Path::new("dir/sub/file2.md")).unwrap();
        fs.remove_dir(Path::new("dir/sub")).unwrap();
        assert!(!fs.is_dir(Path::new("dir/sub")));
    }

    #[test]
    fn test_in_memory_fs_path_normalization() {
        let fs = InMemoryFileSystem::new();

        fs.write_file(Path::new("dir/file.md"), "Content").unwrap();

        assert!(fs.exists(Path::new("dir/./file.md")));
        assert!(fs.exists(Path::new("dir/subdir/../file.md")));
    }

    #[test]
    fn test_real_fs_atomic_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.quire");
        let fs = RealFileSystem;

        fs.write_file(&path, "old").unwrap();
        fs.write_file_atomic(&path, "new").unwrap();

        assert_eq!(fs.read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("project.quire.tmp").exists());
    }
}
