//! Synchronization operations: trash, restore, permanent delete and folder
//! rename, keeping the backing files in step with the document list.
//!
//! File operations here are best-effort. Every relocation runs the same
//! chain: a direct move, then copy+delete, and if both fail only the
//! recorded path changes. Each touched file is reported with its
//! [`FileOutcome`], so a caller can tell a clean run from a degraded one
//! without the operation failing. The next save re-derives every active path
//! and heals any mismatch left behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::document::{Document, DocumentId, DocumentType};
use crate::error::{QuireError, Result};
use crate::fs::{FileSystem, list_files_recursive};
use crate::path::{self, CHAPTER_FILE, TRASH_DIR};
use crate::project::{Project, normalize_folder};
use crate::tree::{NodeKind, TreeNode};

// ============================================================================
// File relocation
// ============================================================================

/// What happened to a file during a relocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    /// Source and destination are the same path
    Unchanged,
    /// Moved in one step
    Moved,
    /// The move failed; the file was copied and the original deleted
    Copied,
    /// Move and copy both failed; only the recorded path changed
    PathOnly,
    /// There was no file at the source; only the recorded path changed
    Missing,
}

impl FileOutcome {
    /// Whether the file now sits at the destination because of this operation
    pub fn file_moved(self) -> bool {
        matches!(self, FileOutcome::Moved | FileOutcome::Copied)
    }

    /// Whether the file and the recorded path now disagree
    pub fn is_degraded(self) -> bool {
        self == FileOutcome::PathOnly
    }
}

/// One file relocated by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relocation {
    /// Owning document; `None` for stray files swept along with a chapter
    pub id: Option<DocumentId>,
    /// Project-relative path before
    pub from: String,
    /// Project-relative path now recorded
    pub to: String,
    /// What happened to the file
    pub outcome: FileOutcome,
}

/// Files touched by a synchronization operation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Every file the operation touched, in order
    pub relocations: Vec<Relocation>,
    /// Documents removed from the project
    pub deleted: Vec<DocumentId>,
}

impl SyncReport {
    /// Relocations that only updated the recorded path
    pub fn degraded(&self) -> impl Iterator<Item = &Relocation> {
        self.relocations.iter().filter(|r| r.outcome.is_degraded())
    }

    /// Whether disk and document list agree after the operation
    pub fn is_clean(&self) -> bool {
        self.degraded().next().is_none()
    }

    /// The relocation of a document's own file
    pub fn relocation_of(&self, id: DocumentId) -> Option<&Relocation> {
        self.relocations.iter().find(|r| r.id == Some(id))
    }
}

/// Move a project-relative file from `from` to `to`.
///
/// Never fails: falls back from move to copy+delete, and reports
/// [`FileOutcome::PathOnly`] if nothing worked. Directories vacated by the
/// move are pruned.
pub(crate) fn relocate<FS: FileSystem>(
    fs: &FS,
    project_dir: &Path,
    from: &str,
    to: &str,
) -> FileOutcome {
    if from == to {
        return FileOutcome::Unchanged;
    }

    let source = path::resolve(project_dir, from);
    let dest = path::resolve(project_dir, to);
    if !fs.exists(&source) || fs.is_dir(&source) {
        log::debug!("No file at {} to move, recording {}", from, to);
        return FileOutcome::Missing;
    }

    let moved = if from.to_lowercase() == to.to_lowercase() {
        move_case_only(fs, &source, &dest)
    } else {
        fs.move_file(&source, &dest)
    };
    let outcome = match moved {
        Ok(()) => {
            log::debug!("Moved {} -> {}", from, to);
            FileOutcome::Moved
        }
        Err(e) => {
            log::warn!("Moving {} -> {} failed ({}), copying instead", from, to, e);
            if let Err(e) = fs.copy_file(&source, &dest) {
                log::error!(
                    "Copying {} -> {} failed ({}); only the recorded path changed",
                    from,
                    to,
                    e
                );
                return FileOutcome::PathOnly;
            }
            if let Err(e) = fs.delete_file(&source) {
                log::warn!("Copied {} but could not delete the original: {}", from, e);
            }
            FileOutcome::Copied
        }
    };

    prune_empty_dirs(fs, project_dir, path::parent_dir(from));
    outcome
}

/// Rename that only changes letter case. Goes through a staging name so it
/// also works where the filesystem treats both names as the same file.
fn move_case_only<FS: FileSystem>(fs: &FS, source: &Path, dest: &Path) -> std::io::Result<()> {
    let mut staging = dest.as_os_str().to_owned();
    staging.push(".rename");
    let staging = PathBuf::from(staging);

    fs.move_file(source, &staging)?;
    fs.move_file(&staging, dest).inspect_err(|_| {
        let _ = fs.move_file(&staging, source);
    })
}

/// `to`, or the first suffixed variant of it that is not taken.
///
/// Files get `name-1.md`, `name-2.md`...; a chapter's `content.md` keeps its
/// name and its directory is suffixed instead.
pub(crate) fn unique_destination(to: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(to) {
        return to.to_string();
    }

    let dir = path::parent_dir(to);
    let file = to.rsplit('/').next().unwrap_or(to);
    (1u32..)
        .map(|n| suffixed(dir, file, n))
        .find(|candidate| !is_taken(candidate.as_str()))
        .unwrap_or_else(|| to.to_string())
}

fn suffixed(dir: &str, file: &str, n: u32) -> String {
    if file == CHAPTER_FILE && !dir.is_empty() {
        let parent = path::parent_dir(dir);
        let name = dir.rsplit('/').next().unwrap_or(dir);
        return join(parent, &format!("{}-{}/{}", name, n, file));
    }

    let name = match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", file, n),
    };
    join(dir, &name)
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", dir, rest)
    }
}

/// Replace the `old_dir` prefix of a path with `new_dir`
fn rebase(path: &str, old_dir: &str, new_dir: &str) -> Option<String> {
    path.strip_prefix(old_dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| format!("{}/{}", new_dir, rest))
}

/// The directory a chapter owns, if `path` is a chapter file nested at least
/// one level below its bucket (so a bucket root is never treated as one).
fn chapter_dir_of(path: &str) -> Option<&str> {
    let dir = path::chapter_dir(path)?;
    let within = path::strip_trash_prefix(dir).unwrap_or(dir);
    within.contains('/').then_some(dir)
}

/// Remove `relative_dir` and its ancestors while they are empty, stopping
/// at the project directory.
pub(crate) fn prune_empty_dirs<FS: FileSystem>(fs: &FS, project_dir: &Path, relative_dir: &str) {
    let mut current = relative_dir;
    while !current.is_empty() {
        let full = path::resolve(project_dir, current);
        if fs.is_dir(&full) {
            let empty = fs.list_entries(&full).is_ok_and(|e| e.is_empty());
            if !empty || fs.remove_dir(&full).is_err() {
                break;
            }
            log::debug!("Removed empty directory {}", current);
        }
        current = path::parent_dir(current);
    }
}

/// Remove every empty directory below and including `dir`
fn remove_empty_tree<FS: FileSystem>(fs: &FS, dir: &Path) {
    if let Ok(entries) = fs.list_entries(dir) {
        for entry in entries.iter().filter(|e| fs.is_dir(e)) {
            remove_empty_tree(fs, entry);
        }
    }
    if fs.list_entries(dir).is_ok_and(|e| e.is_empty()) && fs.remove_dir(dir).is_ok() {
        log::debug!("Removed empty directory {:?}", dir);
    }
}

/// Every path a document record points at, lowercased
fn referenced_paths(project: &Project) -> HashSet<String> {
    project
        .documents
        .iter()
        .filter(|d| d.has_path())
        .map(|d| d.content_file_path.to_lowercase())
        .collect()
}

/// Relocate every file left under `relative_dir`, mapping each path with
/// `target`. Used to carry stray files along with a chapter directory.
/// Files in `keep` belong to other documents and stay put.
fn sweep_directory<FS: FileSystem>(
    fs: &FS,
    project_dir: &Path,
    relative_dir: &str,
    keep: &HashSet<String>,
    target: impl Fn(&str) -> String,
    report: &mut SyncReport,
) {
    let full = path::resolve(project_dir, relative_dir);
    if !fs.is_dir(&full) {
        return;
    }
    let files = match list_files_recursive(fs, &full) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("Could not list {}: {}", relative_dir, e);
            return;
        }
    };

    for file in files {
        let Some(from) = path::to_relative(project_dir, &file) else {
            continue;
        };
        if keep.contains(&from.to_lowercase()) {
            log::debug!("Leaving {} to the document that owns it", from);
            continue;
        }
        let to = unique_destination(&target(&from), |c| {
            fs.exists(&path::resolve(project_dir, c))
        });
        let outcome = relocate(fs, project_dir, &from, &to);
        report.relocations.push(Relocation {
            id: None,
            from,
            to,
            outcome,
        });
    }
    prune_empty_dirs(fs, project_dir, relative_dir);
}

// ============================================================================
// Trash
// ============================================================================

/// Move a document to the trash, preserving its relative path under
/// `Trashcan/`.
///
/// A chapter takes its active scenes and any stray files in its directory
/// along. The recorded path is updated before the file is touched, so the
/// document reads as trashed even if the file stays behind. Trashing a
/// document that is already in the trash does nothing.
pub fn move_to_trash<FS: FileSystem>(
    fs: &FS,
    project: &mut Project,
    id: DocumentId,
) -> Result<SyncReport> {
    let project_dir = project.directory().to_path_buf();
    let mut report = SyncReport::default();

    let doc = project.require(id)?;
    if doc.is_trashed() {
        log::debug!("'{}' is already in the trash", doc.title);
        return Ok(report);
    }
    let is_chapter = doc.doc_type == DocumentType::Chapter;

    let mut affected: Vec<DocumentId> = project
        .documents
        .iter()
        .filter(|d| {
            d.id == id
                || (is_chapter
                    && d.doc_type == DocumentType::Scene
                    && d.parent_id == Some(id)
                    && !d.is_trashed())
        })
        .map(|d| d.id)
        .collect();
    affected.sort_by_key(|doc_id| *doc_id != id);

    // Where each affected file is now, the document itself first. A path
    // cleared by a folder rename still points at the old location.
    let remembered: Vec<Option<String>> = affected
        .iter()
        .map(|doc_id| {
            project
                .document_mut(*doc_id)
                .filter(|d| !d.has_path())
                .and_then(|d| d.take_previous_path())
        })
        .collect();
    let plan: Vec<(DocumentId, String)> = {
        let index = project.index();
        affected
            .iter()
            .zip(remembered)
            .filter_map(|(doc_id, remembered)| {
                let d = index.get(doc_id)?;
                let current = if d.has_path() {
                    d.content_file_path.clone()
                } else if let Some(previous) = remembered {
                    previous
                } else {
                    path::derive_placed_path(d, &index)
                        .unwrap_or_else(|_| path::derive_path_or_orphan(d, &index))
                };
                Some((*doc_id, current))
            })
            .collect()
    };

    // (old, new) directory of a trashed chapter; its scenes follow it
    let mut chapter_dirs: Option<(String, String)> = None;

    for (doc_id, current) in plan {
        let desired = chapter_dirs
            .as_ref()
            .and_then(|(old, new)| rebase(&current, old, new))
            .unwrap_or_else(|| path::to_trash_path(&current));
        let target = unique_destination(&desired, |c| {
            c != current && fs.exists(&path::resolve(&project_dir, c))
        });

        if let Some(doc) = project.document_mut(doc_id) {
            doc.content_file_path = target.clone();
            doc.modified = Utc::now();
        }
        let outcome = relocate(fs, &project_dir, &current, &target);

        if doc_id == id
            && is_chapter
            && let (Some(old), Some(new)) = (chapter_dir_of(&current), chapter_dir_of(&target))
        {
            chapter_dirs = Some((old.to_string(), new.to_string()));
        }

        report.relocations.push(Relocation {
            id: Some(doc_id),
            from: current,
            to: target,
            outcome,
        });
    }

    // Stray files only follow a chapter whose own files moved
    if let Some((old, new)) = &chapter_dirs
        && report.is_clean()
    {
        let keep = referenced_paths(project);
        sweep_directory(
            fs,
            &project_dir,
            old,
            &keep,
            |from| rebase(from, old, new).unwrap_or_else(|| path::to_trash_path(from)),
            &mut report,
        );
    }

    log::info!(
        "Moved {} file(s) to the trash",
        report.relocations.len()
    );
    Ok(report)
}

/// Where a trashed document goes back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTarget {
    /// Bucket type; must match the document's own bucket
    pub bucket: DocumentType,
    /// Folder within the bucket (ignored for types without folders)
    pub folder_path: String,
    /// Chapter to restore a scene into. When `None` a scene keeps its
    /// current parent.
    pub parent_id: Option<DocumentId>,
}

impl RestoreTarget {
    /// The root of a bucket
    pub fn bucket(bucket: DocumentType) -> Self {
        Self {
            bucket: bucket.bucket(),
            folder_path: String::new(),
            parent_id: None,
        }
    }

    /// A folder within a bucket
    pub fn folder(bucket: DocumentType, folder_path: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            ..Self::bucket(bucket)
        }
    }

    /// A chapter, for scenes
    pub fn chapter(chapter: DocumentId) -> Self {
        Self {
            parent_id: Some(chapter),
            ..Self::bucket(DocumentType::Chapter)
        }
    }

    /// The location a document had before it was trashed
    pub fn original(doc: &Document) -> Self {
        Self {
            bucket: doc.doc_type.bucket(),
            folder_path: doc.folder_path.clone(),
            parent_id: doc.parent_id,
        }
    }

    /// The target a drop onto `node` stands for: a bucket, a bucket folder,
    /// or an active chapter. Trash nodes are not targets.
    pub fn from_node(node: &TreeNode, project: &Project) -> Option<Self> {
        match node.kind {
            NodeKind::Bucket(bucket) => Some(Self::bucket(bucket)),
            NodeKind::Folder => {
                let folder = node.folder_path.as_deref()?;
                if path::is_trashed(folder) {
                    return None;
                }
                Some(Self::folder(node.folder_type?, folder))
            }
            NodeKind::Document => {
                let doc = project.document(node.document_id?)?;
                (doc.doc_type == DocumentType::Chapter && !doc.is_trashed())
                    .then(|| Self::chapter(doc.id))
            }
            NodeKind::Root | NodeKind::Trash => None,
        }
    }
}

/// Restore a trashed document into `target`.
///
/// The target must be the document's own bucket. A restored chapter brings
/// its trashed scenes back into its new directory, and stray files swept
/// into the trash with it. Trash directories left empty are removed.
pub fn restore_from_trash<FS: FileSystem>(
    fs: &FS,
    project: &mut Project,
    id: DocumentId,
    target: &RestoreTarget,
) -> Result<SyncReport> {
    let project_dir = project.directory().to_path_buf();

    let (doc_type, current_parent) = {
        let doc = project.require(id)?;
        if !doc.is_trashed() {
            return Err(QuireError::NotTrashed(id));
        }
        (doc.doc_type, doc.parent_id)
    };

    let bucket = target.bucket.bucket();
    if doc_type.bucket() != bucket {
        return Err(QuireError::InvalidRestoreTarget {
            kind: doc_type,
            bucket,
        });
    }
    let parent = match doc_type {
        DocumentType::Scene => target.parent_id.or(current_parent),
        _ => target.parent_id,
    };
    project.validate_parent(doc_type, parent)?;
    let folder = normalize_folder(doc_type, &target.folder_path);

    let trashed_path = {
        let doc = project
            .document_mut(id)
            .ok_or(QuireError::DocumentNotFound(id))?;
        doc.parent_id = parent;
        doc.folder_path = folder;
        doc.modified = Utc::now();
        doc.content_file_path.clone()
    };

    let mut ids = vec![id];
    if doc_type == DocumentType::Chapter {
        ids.extend(
            project
                .documents
                .iter()
                .filter(|d| {
                    d.doc_type == DocumentType::Scene && d.parent_id == Some(id) && d.is_trashed()
                })
                .map(|d| d.id),
        );
    }

    let mut report = SyncReport::default();
    // Directory the chapter was restored into; its scenes follow it
    let mut chapter_dir: Option<String> = None;

    for doc_id in ids {
        let (from, desired) = {
            let index = project.index();
            let doc = project.require(doc_id)?;
            let desired = match &chapter_dir {
                Some(dir) if doc_id != id => format!("{}/{}.md", dir, path::sanitize(&doc.title)),
                _ => path::derive_placed_path(doc, &index)?,
            };
            (doc.content_file_path.clone(), desired)
        };
        let to = unique_destination(&desired, |c| {
            c != from && fs.exists(&path::resolve(&project_dir, c))
        });

        if let Some(doc) = project.document_mut(doc_id) {
            doc.content_file_path = to.clone();
        }
        let outcome = relocate(fs, &project_dir, &from, &to);

        if doc_id == id && doc_type == DocumentType::Chapter {
            chapter_dir = chapter_dir_of(&to).map(str::to_string);
        }

        report.relocations.push(Relocation {
            id: Some(doc_id),
            from,
            to,
            outcome,
        });
    }

    if let (Some(old), Some(new)) = (chapter_dir_of(&trashed_path), &chapter_dir)
        && report.is_clean()
    {
        let keep = referenced_paths(project);
        sweep_directory(
            fs,
            &project_dir,
            old,
            &keep,
            |from| {
                rebase(from, old, new).unwrap_or_else(|| {
                    path::strip_trash_prefix(from).unwrap_or(from).to_string()
                })
            },
            &mut report,
        );
    }
    prune_empty_dirs(fs, &project_dir, path::parent_dir(&trashed_path));

    log::info!(
        "Restored {} file(s) from the trash",
        report.relocations.len()
    );
    Ok(report)
}

// ============================================================================
// Permanent delete
// ============================================================================

/// Remove a document's record and delete its file. A chapter also takes
/// the rest of its directory, except files other records still point at.
/// Deletion errors are logged and ignored.
fn delete_record<FS: FileSystem>(
    fs: &FS,
    project_dir: &Path,
    project: &mut Project,
    id: DocumentId,
) -> bool {
    let Ok(position) = project.position(id) else {
        return false;
    };
    let doc = project.documents.remove(position);

    if let Some(full) = doc.full_path(project_dir) {
        match fs.delete_file(&full) {
            Ok(()) => log::debug!("Deleted {}", doc.content_file_path),
            Err(e) => log::debug!("Ignoring failure to delete {}: {}", doc.content_file_path, e),
        }
        if doc.doc_type == DocumentType::Chapter
            && let Some(dir) = chapter_dir_of(&doc.content_file_path)
        {
            let keep = referenced_paths(project);
            delete_tree(fs, project_dir, dir, &keep);
        }
        prune_empty_dirs(fs, project_dir, path::parent_dir(&doc.content_file_path));
    }
    true
}

/// Delete every file below `relative_dir` that is not in `keep`, then the
/// directories left empty
fn delete_tree<FS: FileSystem>(
    fs: &FS,
    project_dir: &Path,
    relative_dir: &str,
    keep: &HashSet<String>,
) {
    let dir = path::resolve(project_dir, relative_dir);
    if !fs.is_dir(&dir) {
        return;
    }
    if let Ok(files) = list_files_recursive(fs, &dir) {
        for file in files {
            let kept = path::to_relative(project_dir, &file)
                .is_some_and(|rel| keep.contains(&rel.to_lowercase()));
            if kept {
                log::debug!("Keeping {:?}, another document still uses it", file);
                continue;
            }
            if let Err(e) = fs.delete_file(&file) {
                log::debug!("Ignoring failure to delete {:?}: {}", file, e);
            }
        }
    }
    remove_empty_tree(fs, &dir);
}

/// Permanently delete a trashed document.
///
/// Only trashed documents can be deleted. A chapter takes its trashed scenes
/// with it.
pub fn permanent_delete<FS: FileSystem>(
    fs: &FS,
    project: &mut Project,
    id: DocumentId,
) -> Result<SyncReport> {
    let project_dir = project.directory().to_path_buf();

    let doc = project.require(id)?;
    if !doc.is_trashed() {
        return Err(QuireError::NotTrashed(id));
    }
    let is_chapter = doc.doc_type == DocumentType::Chapter;

    // Scenes go before their chapter so the chapter's directory is free of
    // referenced files by the time it is cleared
    let mut ids: Vec<DocumentId> = project
        .documents
        .iter()
        .filter(|d| {
            d.id == id
                || (is_chapter
                    && d.doc_type == DocumentType::Scene
                    && d.parent_id == Some(id)
                    && d.is_trashed())
        })
        .map(|d| d.id)
        .collect();
    ids.sort_by_key(|doc_id| *doc_id == id);

    let mut report = SyncReport::default();
    for doc_id in ids {
        if delete_record(fs, &project_dir, project, doc_id) {
            report.deleted.push(doc_id);
        }
    }
    log::info!("Permanently deleted {} document(s)", report.deleted.len());
    Ok(report)
}

/// Permanently delete every trashed document and clear the trash directory
pub fn empty_trash<FS: FileSystem>(fs: &FS, project: &mut Project) -> SyncReport {
    let project_dir = project.directory().to_path_buf();

    let ids: Vec<DocumentId> = project
        .documents
        .iter()
        .filter(|d| d.is_trashed())
        .map(|d| d.id)
        .collect();

    let mut report = SyncReport::default();
    for id in ids {
        if delete_record(fs, &project_dir, project, id) {
            report.deleted.push(id);
        }
    }
    let keep = referenced_paths(project);
    delete_tree(fs, &project_dir, TRASH_DIR, &keep);

    log::info!("Emptied the trash ({} document(s))", report.deleted.len());
    report
}

// ============================================================================
// Folder rename
// ============================================================================

/// Rename the last segment of a folder within a bucket.
///
/// Every active document in the folder or below it gets the new prefix and
/// has its path cleared; the next save derives the new paths and moves the
/// files. Scenes of affected chapters are cleared too. Returns the documents
/// whose folder changed.
pub fn rename_folder(
    project: &mut Project,
    bucket: DocumentType,
    folder_path: &str,
    new_name: &str,
) -> Result<Vec<DocumentId>> {
    let bucket = bucket.bucket();
    let new_name = new_name.trim();
    if new_name.is_empty()
        || new_name.contains(['/', '\\'])
        || new_name == "."
        || new_name == ".."
    {
        return Err(QuireError::InvalidFolderName(new_name.to_string()));
    }

    let old = normalize_folder(bucket, folder_path);
    let not_found = || QuireError::FolderNotFound {
        bucket,
        path: folder_path.to_string(),
    };
    if old.is_empty() {
        return Err(not_found());
    }
    let new = join(path::parent_dir(&old), new_name);

    let in_folder = |folder: &str| {
        folder == old
            || folder
                .strip_prefix(old.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    };
    let affected: Vec<DocumentId> = project
        .documents
        .iter()
        .filter(|d| d.doc_type == bucket && !d.is_trashed() && in_folder(&d.folder_path))
        .map(|d| d.id)
        .collect();
    if affected.is_empty() {
        return Err(not_found());
    }

    for doc in project.documents.iter_mut() {
        if affected.contains(&doc.id) {
            doc.folder_path = format!("{}{}", new, &doc.folder_path[old.len()..]);
            doc.modified = Utc::now();
            doc.clear_path();
        } else if doc.doc_type == DocumentType::Scene
            && !doc.is_trashed()
            && doc.parent_id.is_some_and(|p| affected.contains(&p))
        {
            doc.clear_path();
        }
    }

    log::info!(
        "Renamed folder '{}' to '{}' ({} document(s))",
        old,
        new,
        affected.len()
    );
    Ok(affected)
}
