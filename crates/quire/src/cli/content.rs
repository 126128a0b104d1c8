//! `cat` and `write` command handlers

use std::io::{self, Read};
use std::path::PathBuf;

use quire_core::fs::{FileSystem, RealFileSystem};

use crate::cli::util::{self, CliStore};

/// Print a document's content to stdout
pub fn handle_cat(store: &CliStore, project_override: Option<PathBuf>, document: &str) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };
    let dir = project.directory().to_path_buf();
    let Some(doc) = project.document_mut(id) else {
        return false;
    };

    match doc.load_content(&RealFileSystem, &dir) {
        Ok(content) => {
            print!("{}", content);
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Replace a document's content with everything read from stdin
pub fn handle_write(store: &CliStore, project_override: Option<PathBuf>, document: &str) -> bool {
    let mut text = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut text) {
        eprintln!("✗ Could not read stdin: {}", e);
        return false;
    }

    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };
    let dir = project.directory().to_path_buf();
    let Some(doc) = project.document_mut(id) else {
        return false;
    };

    // An empty cache means "not loaded", so clearing goes straight to disk
    if text.is_empty()
        && let Some(full) = doc.full_path(&dir)
        && let Err(e) = RealFileSystem.write_file(&full, "")
    {
        eprintln!("✗ {}", e);
        return false;
    }
    doc.set_content(text);
    let title = doc.title.clone();

    if !util::save_project(store, &mut project) {
        return false;
    }
    println!("✓ Wrote '{}'", title);
    true
}
