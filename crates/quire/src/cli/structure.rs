//! `add`, `rename`, `move`, `reorder` and `rename-folder` command handlers
//!
//! Each command edits the project structure, then saves so files follow
//! the new titles and locations.

use std::path::PathBuf;

use quire_core::sync;

use crate::cli::util::{self, CliStore};

pub fn handle_add(
    store: &CliStore,
    project_override: Option<PathBuf>,
    doc_type: &str,
    title: &str,
    parent: Option<String>,
    folder: &str,
) -> bool {
    let Some(doc_type) = util::parse_doc_type(doc_type) else {
        return false;
    };
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(parent) = util::find_optional_document(&project, parent.as_deref()) else {
        return false;
    };

    let id = match project.add_document(title, doc_type, parent, folder) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if !util::save_project(store, &mut project) {
        return false;
    }

    if let Some(doc) = project.document(id) {
        println!("✓ Added {} '{}' ({})", doc.doc_type, doc.title, util::short_id(id));
        println!("  {}", doc.content_file_path);
    }
    true
}

pub fn handle_rename(
    store: &CliStore,
    project_override: Option<PathBuf>,
    document: &str,
    new_title: &str,
) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };

    if let Err(e) = project.rename_document(id, new_title) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !util::save_project(store, &mut project) {
        return false;
    }
    println!("✓ Renamed to '{}'", new_title.trim());
    true
}

pub fn handle_move(
    store: &CliStore,
    project_override: Option<PathBuf>,
    document: &str,
    parent: Option<String>,
    folder: &str,
) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };
    let Some(parent) = util::find_optional_document(&project, parent.as_deref()) else {
        return false;
    };

    if let Err(e) = project.move_document(id, parent, folder) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !util::save_project(store, &mut project) {
        return false;
    }
    if let Some(doc) = project.document(id) {
        println!("✓ Moved '{}'", doc.title);
    }
    true
}

pub fn handle_reorder(
    store: &CliStore,
    project_override: Option<PathBuf>,
    document: &str,
    index: usize,
) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };

    if let Err(e) = project.reorder_document(id, index) {
        eprintln!("✗ {}", e);
        return false;
    }
    if !util::save_project(store, &mut project) {
        return false;
    }
    if let Some(doc) = project.document(id) {
        println!("✓ '{}' is now at position {}", doc.title, doc.order);
    }
    true
}

pub fn handle_rename_folder(
    store: &CliStore,
    project_override: Option<PathBuf>,
    doc_type: &str,
    folder: &str,
    new_name: &str,
) -> bool {
    let Some(bucket) = util::parse_doc_type(doc_type) else {
        return false;
    };
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };

    let affected = match sync::rename_folder(&mut project, bucket, folder, new_name) {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if !util::save_project(store, &mut project) {
        return false;
    }
    println!(
        "✓ Renamed folder '{}' to '{}' ({} document(s))",
        folder,
        new_name.trim(),
        affected.len()
    );
    true
}
