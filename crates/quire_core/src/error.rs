use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::document::{DocumentId, DocumentType};

/// Unified error type for quire operations
#[derive(Debug, Error)]
pub enum QuireError {
    // IO errors
    /// Filesystem failure without more context
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file could not be read
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// A file could not be written
    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    // Project index errors
    /// The project index is not valid JSON for a project
    #[error("Failed to parse project file '{path}': {source}")]
    ProjectParse {
        /// Index file
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// The project could not be turned into JSON
    #[error("Failed to serialize project: {0}")]
    ProjectSerialize(#[from] serde_json::Error),

    /// No index file at the given path
    #[error("Project not found at '{0}'")]
    ProjectNotFound(PathBuf),

    /// Creating would overwrite an existing index file
    #[error("Project already exists at '{0}'")]
    ProjectAlreadyExists(PathBuf),

    // Config errors
    /// The config file is not valid TOML for a config
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be turned into TOML
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// The platform has no config directory
    #[error("Could not determine config directory")]
    NoConfigDir,

    // Structural edit errors (rejected before any mutation)
    /// Title is blank after trimming
    #[error("Title must not be empty")]
    EmptyTitle,

    /// No document with this id
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),

    /// A scene was given no parent
    #[error("Scene needs a parent chapter")]
    MissingParent,

    /// The parent is not a live chapter, or the document cannot have one
    #[error("Parent {parent} of a {kind} must be a chapter")]
    InvalidParent {
        /// Rejected parent
        parent: DocumentId,
        /// Type of the document being placed
        kind: DocumentType,
    },

    /// A scene's parent is missing or is not a chapter
    #[error("Scene {0} has no resolvable parent chapter")]
    OrphanedScene(DocumentId),

    /// Restore or permanent delete of a live document
    #[error("Document {0} is not in the trash")]
    NotTrashed(DocumentId),

    /// Restore into a bucket of another type
    #[error("Cannot place a {kind} in the {bucket} bucket")]
    InvalidRestoreTarget {
        /// Type of the restored document
        kind: DocumentType,
        /// Requested bucket
        bucket: DocumentType,
    },

    /// Folder name is blank or contains a separator
    #[error("Invalid folder name '{0}'")]
    InvalidFolderName(String),

    /// No active document lives in the folder
    #[error("No folder '{path}' in the {bucket} bucket")]
    FolderNotFound {
        /// Bucket searched
        bucket: DocumentType,
        /// Folder path as given
        path: String,
    },
}

/// Result type alias for quire operations
pub type Result<T> = std::result::Result<T, QuireError>;

/// A serializable representation of QuireError for IPC with a desktop front end
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&QuireError> for SerializableError {
    fn from(err: &QuireError) -> Self {
        let kind = match err {
            QuireError::Io(_) => "Io",
            QuireError::FileRead { .. } => "FileRead",
            QuireError::FileWrite { .. } => "FileWrite",
            QuireError::ProjectParse { .. } => "ProjectParse",
            QuireError::ProjectSerialize(_) => "ProjectSerialize",
            QuireError::ProjectNotFound(_) => "ProjectNotFound",
            QuireError::ProjectAlreadyExists(_) => "ProjectAlreadyExists",
            QuireError::ConfigParse(_) => "ConfigParse",
            QuireError::ConfigSerialize(_) => "ConfigSerialize",
            QuireError::NoConfigDir => "NoConfigDir",
            QuireError::EmptyTitle => "EmptyTitle",
            QuireError::DocumentNotFound(_) => "DocumentNotFound",
            QuireError::MissingParent => "MissingParent",
            QuireError::InvalidParent { .. } => "InvalidParent",
            QuireError::OrphanedScene(_) => "OrphanedScene",
            QuireError::NotTrashed(_) => "NotTrashed",
            QuireError::InvalidRestoreTarget { .. } => "InvalidRestoreTarget",
            QuireError::InvalidFolderName(_) => "InvalidFolderName",
            QuireError::FolderNotFound { .. } => "FolderNotFound",
        }
        .to_string();

        let path = match err {
            QuireError::FileRead { path, .. } => Some(path.clone()),
            QuireError::FileWrite { path, .. } => Some(path.clone()),
            QuireError::ProjectParse { path, .. } => Some(path.clone()),
            QuireError::ProjectNotFound(path) => Some(path.clone()),
            QuireError::ProjectAlreadyExists(path) => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<QuireError> for SerializableError {
    fn from(err: QuireError) -> Self {
        SerializableError::from(&err)
    }
}

impl QuireError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// True for errors caused by bad user input (nothing was mutated)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            QuireError::EmptyTitle
                | QuireError::DocumentNotFound(_)
                | QuireError::MissingParent
                | QuireError::InvalidParent { .. }
                | QuireError::NotTrashed(_)
                | QuireError::InvalidRestoreTarget { .. }
                | QuireError::InvalidFolderName(_)
                | QuireError::FolderNotFound { .. }
        )
    }
}
