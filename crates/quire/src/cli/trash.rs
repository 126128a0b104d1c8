//! `trash`, `restore`, `delete` and `empty-trash` command handlers

use std::path::PathBuf;

use quire_core::fs::RealFileSystem;
use quire_core::sync::{self, RestoreTarget, SyncReport};

use crate::cli::util::{self, CliStore};

fn print_sync_report(report: &SyncReport) {
    for relocation in &report.relocations {
        if relocation.outcome.file_moved() {
            println!("  {} → {}", relocation.from, relocation.to);
        }
    }
    for relocation in report.degraded() {
        eprintln!(
            "  ⚠ {} could not be moved ({:?}), now tracked at {}",
            relocation.from, relocation.outcome, relocation.to
        );
    }
}

pub fn handle_trash(store: &CliStore, project_override: Option<PathBuf>, document: &str) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };

    let report = match sync::move_to_trash(&RealFileSystem, &mut project, id) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    print_sync_report(&report);
    if !util::save_project(store, &mut project) {
        return false;
    }

    let title = project.document(id).map_or("", |d| d.title.as_str());
    match report.relocations.iter().filter(|r| r.id.is_some()).count() {
        0 | 1 => println!("✓ Moved '{}' to the trash", title),
        n => println!("✓ Moved '{}' and {} scene(s) to the trash", title, n - 1),
    }
    true
}

pub fn handle_restore(
    store: &CliStore,
    project_override: Option<PathBuf>,
    document: &str,
    folder: Option<String>,
    parent: Option<String>,
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
    let Some(doc) = project.document(id) else {
        return false;
    };

    let mut target = RestoreTarget::original(doc);
    if let Some(folder) = folder {
        target.folder_path = folder;
    }
    if parent.is_some() {
        target.parent_id = parent;
    }

    let report = match sync::restore_from_trash(&RealFileSystem, &mut project, id, &target) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    print_sync_report(&report);
    if !util::save_project(store, &mut project) {
        return false;
    }
    if let Some(doc) = project.document(id) {
        println!("✓ Restored '{}'", doc.title);
    }
    true
}

pub fn handle_delete(
    store: &CliStore,
    project_override: Option<PathBuf>,
    document: &str,
    yes: bool,
) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let Some(id) = util::find_document(&project, document) else {
        return false;
    };
    let title = project.document(id).map(|d| d.title.clone()).unwrap_or_default();

    if !yes && !util::prompt_confirm(&format!("Permanently delete '{}'?", title)) {
        println!("Cancelled");
        return true;
    }

    let report = match sync::permanent_delete(&RealFileSystem, &mut project, id) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    if !util::save_project(store, &mut project) {
        return false;
    }
    println!(
        "✓ Deleted '{}' ({} document(s))",
        title,
        report.deleted.len()
    );
    true
}

pub fn handle_empty_trash(store: &CliStore, project_override: Option<PathBuf>, yes: bool) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let trashed = project.documents.iter().filter(|d| d.is_trashed()).count();
    if trashed == 0 {
        println!("Trash is already empty");
        return true;
    }

    if !yes
        && !util::prompt_confirm(&format!(
            "Permanently delete {} trashed document(s)?",
            trashed
        ))
    {
        println!("Cancelled");
        return true;
    }

    let report = sync::empty_trash(&RealFileSystem, &mut project);
    if !util::save_project(store, &mut project) {
        return false;
    }
    println!("✓ Emptied trash ({} document(s))", report.deleted.len());
    true
}
