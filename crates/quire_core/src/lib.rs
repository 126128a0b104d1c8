#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Configuration options
pub mod config;

/// Documents and their lazily loaded content
pub mod document;

/// Error (common error types)
pub mod error;

/// Filesystem abstraction
pub mod fs;

/// Path derivation and the trash prefix
pub mod path;

/// Projects and structural edits
pub mod project;

/// Statistics (word and character counts)
pub mod stats;

/// Saving and loading projects
pub mod store;

/// Trash, restore, permanent delete and folder rename
pub mod sync;

/// Display tree
pub mod tree;

/// Fault-injecting filesystem for tests
#[cfg(test)]
pub mod test_utils;
