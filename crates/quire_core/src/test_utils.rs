//! Test utilities for quire_core
//!
//! Provides a fault-injecting filesystem wrapper so the fallback chains in
//! the save and trash code can be exercised deterministically.

use std::io;
use std::path::{Path, PathBuf};

use crate::fs::{FileSystem, InMemoryFileSystem};

/// Wraps an [`InMemoryFileSystem`] and fails selected operations.
#[derive(Clone, Default)]
pub struct FaultyFileSystem {
    inner: InMemoryFileSystem,
    fail_reads: bool,
    fail_moves: bool,
    fail_copies: bool,
    fail_deletes: bool,
}

impl FaultyFileSystem {
    /// Wrap a filesystem with no faults enabled.
    pub fn new(inner: InMemoryFileSystem) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Make every `read_to_string` fail.
    pub fn fail_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Make every `move_file` fail.
    pub fn fail_moves(mut self) -> Self {
        self.fail_moves = true;
        self
    }

    /// Make every `copy_file` fail.
    pub fn fail_copies(mut self) -> Self {
        self.fail_copies = true;
        self
    }

    /// Make every `delete_file` fail.
    pub fn fail_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    fn injected(op: &str) -> io::Error {
        io::Error::other(format!("injected {} failure", op))
    }
}

impl FileSystem for FaultyFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if self.fail_reads {
            return Err(Self::injected("read"));
        }
        self.inner.read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        self.inner.write_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        if self.fail_deletes {
            return Err(Self::injected("delete"));
        }
        self.inner.delete_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.fail_moves {
            return Err(Self::injected("move"));
        }
        self.inner.move_file(from, to)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.fail_copies {
            return Err(Self::injected("copy"));
        }
        self.inner.copy_file(from, to)
    }

    fn list_entries(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_entries(dir)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_dir(path)
    }
}
