//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(
    about = "Organize a long-form writing project as plain markdown files",
    long_about = None
)]
pub struct Cli {
    /// Project index file, or a directory containing one
    /// (default: most recently opened project)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project
    Init {
        /// Project name (also names the index file)
        name: String,

        /// Directory to create the project in (default: config's project dir + name)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Start without the sample chapter, scene, character, location and note
        #[arg(long)]
        empty: bool,

        /// Author to record (default: config's default_author)
        #[arg(short, long)]
        author: Option<String>,
    },

    /// Show the project tree
    Tree {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a document
    Add {
        /// Document type (chapter, scene, character, location, note, ...)
        doc_type: String,

        /// Title of the new document
        title: String,

        /// Parent chapter (required for scenes)
        #[arg(long)]
        parent: Option<String>,

        /// Folder inside the type's bucket, e.g. "Part 1"
        #[arg(short, long, default_value = "")]
        folder: String,
    },

    /// Change a document's title (its file is renamed on save)
    Rename {
        /// Document id, id prefix or title
        document: String,

        /// New title
        new_title: String,
    },

    /// Move a document to another folder, or a scene to another chapter
    #[command(alias = "mv")]
    Move {
        /// Document id, id prefix or title
        document: String,

        /// New parent chapter (scenes only)
        #[arg(long)]
        parent: Option<String>,

        /// Destination folder inside the bucket ("" for the bucket root)
        #[arg(short, long, default_value = "")]
        folder: String,
    },

    /// Move a document to a position among its siblings
    Reorder {
        /// Document id, id prefix or title
        document: String,

        /// Zero-based position
        index: usize,
    },

    /// Move a document (and a chapter's scenes) to the trash
    Trash {
        /// Document id, id prefix or title
        document: String,
    },

    /// Bring a document back from the trash
    Restore {
        /// Document id, id prefix or title
        document: String,

        /// Folder inside the bucket (default: where it was trashed from)
        #[arg(short, long)]
        folder: Option<String>,

        /// Chapter to restore a scene into (default: its previous chapter)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Permanently delete a trashed document
    Delete {
        /// Document id, id prefix or title
        document: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Permanently delete everything in the trash
    EmptyTrash {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a folder in a bucket (files move on save)
    RenameFolder {
        /// Bucket document type, e.g. chapter
        doc_type: String,

        /// Folder path, e.g. "Part 1"
        folder: String,

        /// New name for the last folder segment
        new_name: String,
    },

    /// Show word, character, sentence and paragraph counts
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a document's content
    Cat {
        /// Document id, id prefix or title
        document: String,
    },

    /// Replace a document's content with stdin
    Write {
        /// Document id, id prefix or title
        document: String,
    },

    /// Save the project, moving files whose paths changed
    Save,

    /// List recently opened projects
    Recent,
}
