//! Shared CLI utilities

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quire_core::config::Config;
use quire_core::document::{Document, DocumentId, DocumentType};
use quire_core::fs::{FileSystem, RealFileSystem};
use quire_core::project::{PROJECT_EXTENSION, Project};
use quire_core::store::{ProjectStore, SaveReport};

/// Store type used by every command
pub type CliStore = ProjectStore<RealFileSystem>;

/// Load config or print error message
pub fn load_config() -> Option<Config> {
    match Config::load() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            None
        }
    }
}

/// Record `index` at the front of the recent projects list.
/// Failing to write the config only warns.
pub fn remember_project(index: &Path) {
    let Some(mut config) = load_config() else {
        return;
    };
    let index = index.canonicalize().unwrap_or_else(|_| index.to_path_buf());
    config.add_recent(index);
    config.prune_recent(&RealFileSystem);
    if let Err(e) = config.save() {
        log::warn!("Could not update recent projects: {}", e);
    }
}

fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

/// Resolve the project index file to operate on.
///
/// `--project` may name the index file itself or a directory holding
/// exactly one. Without it the most recently opened project is used.
pub fn resolve_project_path(project_override: Option<PathBuf>) -> Option<PathBuf> {
    let fs = RealFileSystem;

    let Some(candidate) = project_override else {
        let config = load_config()?;
        return match config.recent_projects.into_iter().find(|p| fs.exists(p)) {
            Some(path) => Some(path),
            None => {
                eprintln!("✗ No project given and no recent project found");
                eprintln!("  Pass --project or run 'quire init' first");
                None
            }
        };
    };

    if !fs.is_dir(&candidate) {
        return Some(candidate);
    }

    let entries = match fs.list_entries(&candidate) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("✗ Could not read {}: {}", candidate.display(), e);
            return None;
        }
    };
    let mut indexes: Vec<PathBuf> = entries
        .into_iter()
        .filter(|p| is_project_file(p) && !fs.is_dir(p))
        .collect();

    match indexes.len() {
        1 => indexes.pop(),
        0 => {
            eprintln!(
                "✗ No .{} file in {}",
                PROJECT_EXTENSION,
                candidate.display()
            );
            None
        }
        _ => {
            eprintln!(
                "✗ Several project files in {}, pass one with --project:",
                candidate.display()
            );
            indexes.sort();
            for index in indexes {
                eprintln!("  {}", index.display());
            }
            None
        }
    }
}

/// Resolve and load the project, remembering it as recently opened
pub fn open_project(store: &CliStore, project_override: Option<PathBuf>) -> Option<Project> {
    let index = resolve_project_path(project_override)?;
    match store.load(&index) {
        Ok(project) => {
            remember_project(&project.path);
            Some(project)
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            None
        }
    }
}

/// Save the project in place and report moved files and failures.
/// Returns false if the index could not be written or a document failed.
pub fn save_project(store: &CliStore, project: &mut Project) -> bool {
    let index = project.path.clone();
    match store.save(project, &index) {
        Ok(report) => {
            print_save_report(project, &report);
            report.failed.is_empty()
        }
        Err(e) => {
            eprintln!("✗ Failed to save project: {}", e);
            false
        }
    }
}

fn print_save_report(project: &Project, report: &SaveReport) {
    for relocation in report.moved() {
        println!("  {} → {}", relocation.from, relocation.to);
    }
    for relocation in report.relocations.iter().filter(|r| r.outcome.is_degraded()) {
        eprintln!(
            "  ⚠ {} could not be moved ({:?}), now tracked at {}",
            relocation.from, relocation.outcome, relocation.to
        );
    }
    for (id, message) in &report.failed {
        let title = project.document(*id).map_or("?", |d| d.title.as_str());
        eprintln!("✗ {} ({}): {}", title, short_id(*id), message);
    }
}

/// First eight characters of an id, as shown in listings
pub fn short_id(id: DocumentId) -> String {
    id.to_string().chars().take(8).collect()
}

/// Find a document by full id, id prefix, or case-insensitive title.
///
/// Prints the candidates and returns None when the query is ambiguous.
pub fn find_document(project: &Project, query: &str) -> Option<DocumentId> {
    let query = query.trim();
    if let Ok(id) = query.parse::<DocumentId>()
        && project.document(id).is_some()
    {
        return Some(id);
    }

    let by_title: Vec<&Document> = project
        .documents
        .iter()
        .filter(|d| d.title.eq_ignore_ascii_case(query))
        .collect();
    let matches = if by_title.is_empty() && !query.is_empty() {
        let prefix = query.to_lowercase();
        project
            .documents
            .iter()
            .filter(|d| d.id.to_string().starts_with(&prefix))
            .collect()
    } else {
        by_title
    };

    match matches.as_slice() {
        [doc] => Some(doc.id),
        [] => {
            eprintln!("✗ No document matches '{}'", query);
            None
        }
        many => {
            eprintln!("✗ '{}' matches several documents, use an id:", query);
            for doc in many {
                let state = if doc.is_trashed() { " (trashed)" } else { "" };
                eprintln!(
                    "  {}  {} {}{}",
                    short_id(doc.id),
                    doc.doc_type,
                    doc.title,
                    state
                );
            }
            None
        }
    }
}

/// Resolve an optional document query; `Some(None)` when none was given
pub fn find_optional_document(
    project: &Project,
    query: Option<&str>,
) -> Option<Option<DocumentId>> {
    match query {
        Some(q) => find_document(project, q).map(Some),
        None => Some(None),
    }
}

/// Parse a document type name or print the accepted names
pub fn parse_doc_type(name: &str) -> Option<DocumentType> {
    match name.parse::<DocumentType>() {
        Ok(t) => Some(t),
        Err(e) => {
            let names: Vec<String> = DocumentType::BUCKETS
                .iter()
                .chain(std::iter::once(&DocumentType::Scene))
                .map(|t| t.to_string().to_lowercase())
                .collect();
            eprintln!("✗ {}", e);
            eprintln!("  Expected one of: {}", names.join(", "));
            None
        }
    }
}

/// Ask a yes/no question on stdin
pub fn prompt_confirm(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        let mut project = Project::new("Novel");
        project
            .add_document("Chapter 1", DocumentType::Chapter, None, "")
            .unwrap();
        project
            .add_document("Hero", DocumentType::Character, None, "")
            .unwrap();
        project
            .add_document("hero", DocumentType::Note, None, "")
            .unwrap();
        project
    }

    #[test]
    fn test_find_document_by_title_case_insensitive() {
        let project = sample();
        let chapter = project.documents[0].id;
        assert_eq!(find_document(&project, "chapter 1"), Some(chapter));
    }

    #[test]
    fn test_find_document_by_id_and_prefix() {
        let project = sample();
        let id = project.documents[1].id;
        assert_eq!(find_document(&project, &id.to_string()), Some(id));
        assert_eq!(find_document(&project, &id.to_string()[..12]), Some(id));
    }

    #[test]
    fn test_find_document_ambiguous_title() {
        let project = sample();
        assert_eq!(find_document(&project, "HERO"), None);
    }

    #[test]
    fn test_find_document_missing() {
        let project = sample();
        assert_eq!(find_document(&project, "nope"), None);
        assert_eq!(find_document(&project, ""), None);
    }

    #[test]
    fn test_parse_doc_type() {
        assert_eq!(parse_doc_type("scene"), Some(DocumentType::Scene));
        assert_eq!(parse_doc_type("characters"), Some(DocumentType::Character));
        assert_eq!(parse_doc_type("poem"), None);
    }

    #[test]
    fn test_resolve_project_in_directory() {
        let temp = tempfile::tempdir().unwrap();
        let index = temp.path().join("Novel.quire");
        std::fs::write(&index, "{}").unwrap();
        std::fs::write(temp.path().join("notes.md"), "").unwrap();

        let resolved = resolve_project_path(Some(temp.path().to_path_buf()));
        assert_eq!(resolved, Some(index));
    }

    #[test]
    fn test_resolve_project_rejects_ambiguous_directory() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("A.quire"), "{}").unwrap();
        std::fs::write(temp.path().join("B.quire"), "{}").unwrap();

        assert_eq!(resolve_project_path(Some(temp.path().to_path_buf())), None);
    }
}
