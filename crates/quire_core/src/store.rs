//! Saving and loading projects.
//!
//! A project is one JSON index file (the `.quire` file) plus one markdown
//! file per document, laid out relative to the index file's directory. The
//! index holds the structure only; content lives in the document files.
//!
//! Saving is self-healing: every active document's path is re-derived from
//! its current type, title, parent and folder, and files whose derived path
//! changed are moved before anything is flushed.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::document::{Document, DocumentId, DocumentType};
use crate::error::{QuireError, Result};
use crate::fs::FileSystem;
use crate::path;
use crate::project::{PROJECT_EXTENSION, Project};
use crate::stats::{self, ProjectStatistics};
use crate::sync::{FileOutcome, Relocation, relocate, unique_destination};

/// What a save did besides writing the index
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    /// Documents whose derived path changed since the last save
    pub relocations: Vec<Relocation>,
    /// Documents that received their first path
    pub adopted: usize,
    /// Documents whose content could not be written, with the reason
    pub failed: Vec<(DocumentId, String)>,
    /// Statistics recorded in the project metadata
    pub statistics: ProjectStatistics,
}

impl SaveReport {
    /// Relocations that actually moved a file
    pub fn moved(&self) -> impl Iterator<Item = &Relocation> {
        self.relocations.iter().filter(|r| r.outcome.file_moved())
    }

    /// The relocation of a document, if its path changed
    pub fn relocation_of(&self, id: DocumentId) -> Option<&Relocation> {
        self.relocations.iter().find(|r| r.id == Some(id))
    }
}

/// Give a project file path the project extension if it lacks it
pub fn with_project_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION));
    if has_extension {
        return path.to_path_buf();
    }
    let mut normalized = path.as_os_str().to_owned();
    normalized.push(".");
    normalized.push(PROJECT_EXTENSION);
    PathBuf::from(normalized)
}

/// Saves and loads projects through a [`FileSystem`].
pub struct ProjectStore<FS: FileSystem> {
    fs: FS,
}

impl<FS: FileSystem> ProjectStore<FS> {
    /// Create a new store
    pub fn new(fs: FS) -> Self {
        Self { fs }
    }

    /// Create and save a new project in `dir`.
    ///
    /// The index file is named after the project. With `seed`, the project
    /// starts with a sample chapter, scene, character, location and note.
    /// Fails with [`QuireError::ProjectAlreadyExists`] rather than
    /// overwriting an existing index.
    pub fn create(
        &self,
        dir: &Path,
        name: &str,
        seed: bool,
        author: Option<&str>,
    ) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuireError::EmptyTitle);
        }

        let index_path = dir.join(format!("{}.{}", path::sanitize(name), PROJECT_EXTENSION));
        if self.fs.exists(&index_path) {
            return Err(QuireError::ProjectAlreadyExists(index_path));
        }

        let mut project = if seed {
            Project::with_sample_content(name)
        } else {
            Project::new(name)
        };
        project.metadata_mut().author = author.map(str::to_string);

        self.save(&mut project, &index_path)?;
        log::info!("Created project '{}' at {:?}", name, index_path);
        Ok(project)
    }

    /// Save a project to `to`, moving files whose derived path changed.
    ///
    /// Per-document failures never abort the save: they are logged and
    /// listed in the report. Only a failure to write the index is an error.
    pub fn save(&self, project: &mut Project, to: &Path) -> Result<SaveReport> {
        let index_path = with_project_extension(to);
        project.path = index_path.clone();
        let project_dir = project.directory().to_path_buf();
        if !project_dir.as_os_str().is_empty() {
            self.fs.create_dir_all(&project_dir)?;
        }

        // Derived paths are computed up front from the current structure;
        // trashed documents are left where they are
        let mut expected: Vec<Option<String>> = {
            let index = project.index();
            project
                .documents
                .iter()
                .map(|d| (!d.is_trashed()).then(|| path::derive_path_or_orphan(d, &index)))
                .collect()
        };
        // Where each document's file is now, including paths cleared by a
        // folder rename
        let mut sources: Vec<Option<String>> = project
            .documents
            .iter_mut()
            .map(|d| {
                if d.has_path() {
                    Some(d.content_file_path.clone())
                } else {
                    d.take_previous_path()
                }
            })
            .collect();
        let mut claimed: HashSet<String> = sources
            .iter()
            .flatten()
            .map(|p| p.to_lowercase())
            .collect();

        // Scenes go last so they can follow the directory their chapter
        // actually ended up in
        let (scenes, others): (Vec<usize>, Vec<usize>) = (0..project.documents.len())
            .partition(|&i| project.documents[i].doc_type == DocumentType::Scene);
        let mut chapter_paths: HashMap<DocumentId, String> = HashMap::new();
        let mut report = SaveReport::default();

        for i in others.into_iter().chain(scenes) {
            let doc = &mut project.documents[i];
            let Some(derived) = expected[i].take() else {
                self.flush(doc, &project_dir, &mut report);
                continue;
            };
            let target = match doc.parent_id.and_then(|p| chapter_paths.get(&p)) {
                Some(chapter_path) if doc.doc_type == DocumentType::Scene => {
                    path::scene_path_in(chapter_path, doc).unwrap_or(derived)
                }
                _ => derived,
            };

            let placed = self.place(
                doc,
                target,
                sources[i].take(),
                &mut claimed,
                &project_dir,
                &mut report,
            );
            if doc.doc_type == DocumentType::Chapter {
                chapter_paths.insert(doc.id, placed);
            }
        }

        report.statistics = stats::aggregate(&mut project.documents, &self.fs, &project_dir);
        let metadata = project.metadata_mut();
        metadata.statistics = report.statistics.clone();
        metadata.modified = Utc::now();

        let json = serde_json::to_string_pretty(&*project)?;
        self.fs
            .write_file_atomic(&index_path, &json)
            .map_err(|e| QuireError::FileWrite {
                path: index_path.clone(),
                source: e,
            })?;

        log::info!(
            "Saved project '{}' ({} documents, {} moved)",
            project.name,
            project.documents.len(),
            report.moved().count()
        );
        Ok(report)
    }

    /// Give an active document its file at `expected` (or a suffixed
    /// variant if another document holds it), moving the file from `source`.
    /// Returns the path recorded for the document.
    fn place(
        &self,
        doc: &mut Document,
        expected: String,
        source: Option<String>,
        claimed: &mut HashSet<String>,
        project_dir: &Path,
        report: &mut SaveReport,
    ) -> String {
        if source.as_deref() == Some(expected.as_str()) {
            doc.content_file_path = expected;
            self.flush(doc, project_dir, report);
            return doc.content_file_path.clone();
        }

        let source_key = source.as_deref().map(str::to_lowercase);
        let target = unique_destination(&expected, |c| {
            let key = c.to_lowercase();
            if source_key.as_deref() == Some(key.as_str()) {
                return false;
            }
            claimed.contains(&key)
                || (source.is_some() && self.fs.exists(&path::resolve(project_dir, c)))
        });
        if let Some(key) = &source_key {
            claimed.remove(key);
        }
        claimed.insert(target.to_lowercase());

        let Some(from) = source else {
            doc.content_file_path = target.clone();
            report.adopted += 1;
            self.flush(doc, project_dir, report);
            return target;
        };

        let outcome = relocate(&self.fs, project_dir, &from, &target);
        doc.content_file_path = target.clone();
        match outcome {
            FileOutcome::Moved | FileOutcome::Copied => {
                // The file moved with its disk content; pending edits still need writing
                if !doc.cached_content().is_empty() {
                    self.flush(doc, project_dir, report);
                }
            }
            FileOutcome::PathOnly => {
                // The old file is still in place; carry its content over
                if doc.cached_content().is_empty()
                    && let Ok(text) = self.fs.read_to_string(&path::resolve(project_dir, &from))
                {
                    doc.set_content(text);
                }
                self.flush(doc, project_dir, report);
            }
            FileOutcome::Missing | FileOutcome::Unchanged => {
                self.flush(doc, project_dir, report);
            }
        }

        if outcome != FileOutcome::Unchanged {
            report.relocations.push(Relocation {
                id: Some(doc.id),
                from,
                to: target.clone(),
                outcome,
            });
        }
        target
    }

    /// Flush one document, recording failures instead of propagating them
    fn flush(&self, doc: &mut Document, project_dir: &Path, report: &mut SaveReport) {
        if let Err(e) = doc.flush(&self.fs, project_dir) {
            log::warn!("Could not save '{}': {}", doc.title, e);
            report.failed.push((doc.id, e.to_string()));
        }
    }

    /// Load a project from its index file.
    ///
    /// Document content stays on disk until first read. Documents from old
    /// project files that carried their content inline get a path and are
    /// written out immediately.
    pub fn load(&self, index_path: &Path) -> Result<Project> {
        if !self.fs.exists(index_path) || self.fs.is_dir(index_path) {
            return Err(QuireError::ProjectNotFound(index_path.to_path_buf()));
        }

        let text = self
            .fs
            .read_to_string(index_path)
            .map_err(|e| QuireError::FileRead {
                path: index_path.to_path_buf(),
                source: e,
            })?;
        let mut project: Project =
            serde_json::from_str(&text).map_err(|e| QuireError::ProjectParse {
                path: index_path.to_path_buf(),
                source: e,
            })?;
        project.path = index_path.to_path_buf();
        let project_dir = project.directory().to_path_buf();

        let legacy: Vec<(usize, String)> = {
            let index = project.index();
            project
                .documents
                .iter()
                .enumerate()
                .filter(|(_, d)| !d.has_path() && !d.cached_content().is_empty())
                .map(|(i, d)| (i, path::derive_path_or_orphan(d, &index)))
                .collect()
        };
        if !legacy.is_empty() {
            log::info!(
                "Moving inline content of {} document(s) into files",
                legacy.len()
            );
        }
        for (i, derived) in legacy {
            let doc = &mut project.documents[i];
            doc.content_file_path = derived;
            if let Err(e) = doc.flush(&self.fs, &project_dir) {
                log::warn!("Could not write out '{}': {}", doc.title, e);
            }
        }

        project.metadata_mut().last_opened = Some(Utc::now());
        log::info!(
            "Loaded project '{}' ({} documents)",
            project.name,
            project.documents.len()
        );
        Ok(project)
    }
}
