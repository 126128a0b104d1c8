//! Path derivation.
//!
//! Every document's backing file lives at a canonical, project-relative path
//! computed from its type, title, parent chapter and folder. Nothing in this
//! module touches the filesystem; paths are plain `/`-separated strings until
//! [`resolve`] turns them into host paths.
//!
//! | Type | Canonical path |
//! |------|----------------|
//! | Chapter | `Manuscript/[folder/]Title/content.md` |
//! | Scene | `Manuscript/[chapter folder/]Chapter/Title.md` |
//! | Character, Location, Research, Timeline, Plot, Object, Entity | `bucket/[folder/]Title.md` |
//! | Note | `notes/Title.md` |
//! | Other | `other/Title.md` |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::document::{Document, DocumentId, DocumentType};
use crate::error::{QuireError, Result};

/// Directory that holds soft-deleted documents
pub const TRASH_DIR: &str = "Trashcan";

/// Reserved prefix marking a path as trashed (matched case-insensitively)
pub const TRASH_PREFIX: &str = "Trashcan/";

/// File name of a chapter's own prose inside its directory
pub const CHAPTER_FILE: &str = "content.md";

/// Directory used for scenes whose chapter cannot be resolved
pub const ORPHAN_SCENE_DIR: &str = "scenes";

/// Lookup of every document in a project by id
pub type DocumentIndex<'a> = HashMap<DocumentId, &'a Document>;

/// Build an id lookup over a flat document list
pub fn index_documents(documents: &[Document]) -> DocumentIndex<'_> {
    documents.iter().map(|d| (d.id, d)).collect()
}

/// Characters that are invalid in a file name on at least one supported OS
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows refuses as file names
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turn an arbitrary title into a single filesystem-safe path segment.
///
/// Invalid characters, separators and whitespace become `-`, runs of them
/// collapse to one `-`, other punctuation is dropped, and leading/trailing
/// `-`, `.` and spaces are trimmed. Never returns an empty string.
///
/// # Example
/// ```
/// use quire_core::path::sanitize;
///
/// assert_eq!(sanitize("Scene One!"), "Scene-One");
/// assert_eq!(sanitize("a/b\\c"), "a-b-c");
/// assert_eq!(sanitize("  ...  "), "untitled");
/// ```
pub fn sanitize(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c == '-' || c.is_whitespace() || c.is_control() || INVALID_CHARS.contains(&c) {
            pending_hyphen = true;
        } else if c.is_alphanumeric() || c == '_' || c == '.' {
            if pending_hyphen && !result.is_empty() {
                result.push('-');
            }
            pending_hyphen = false;
            result.push(c);
        }
        // Any other punctuation is dropped
    }

    let trimmed = result.trim_matches(|c| c == '-' || c == '.' || c == ' ');
    if trimmed.is_empty() {
        return "untitled".to_string();
    }

    let (stem, extension) = match trimmed.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (trimmed, None),
    };
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        return match extension {
            Some(ext) => format!("{}_.{}", stem, ext),
            None => format!("{}_", stem),
        };
    }

    trimmed.to_string()
}

/// Sanitize a `/`-separated folder path one segment at a time.
///
/// Empty segments are skipped, so `"/Part 1//Act 2/"` becomes `"Part-1/Act-2"`
/// and a blank folder path stays empty.
pub fn sanitize_folder_path(folder_path: &str) -> String {
    folder_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(sanitize)
        .collect::<Vec<_>>()
        .join("/")
}

/// Compute the canonical project-relative path for a document.
///
/// Pure: only the document and the id lookup are consulted. A Scene whose
/// parent is missing or is not a Chapter yields [`QuireError::OrphanedScene`].
pub fn derive_path(doc: &Document, index: &DocumentIndex) -> Result<String> {
    let title = sanitize(&doc.title);

    match doc.doc_type {
        DocumentType::Chapter => Ok(join([
            DocumentType::Chapter.bucket_dir(),
            sanitize_folder_path(&doc.folder_path).as_str(),
            title.as_str(),
            CHAPTER_FILE,
        ])),
        DocumentType::Scene => {
            let chapter = doc
                .parent_id
                .and_then(|id| index.get(&id))
                .filter(|parent| parent.doc_type == DocumentType::Chapter)
                .ok_or(QuireError::OrphanedScene(doc.id))?;

            Ok(join([
                DocumentType::Scene.bucket_dir(),
                sanitize_folder_path(&chapter.folder_path).as_str(),
                sanitize(&chapter.title).as_str(),
                format!("{}.md", title).as_str(),
            ]))
        }
        DocumentType::Note | DocumentType::Other => Ok(join([
            doc.doc_type.bucket_dir(),
            format!("{}.md", title).as_str(),
        ])),
        DocumentType::Character
        | DocumentType::Location
        | DocumentType::Research
        | DocumentType::Timeline
        | DocumentType::Plot
        | DocumentType::Object
        | DocumentType::Entity => Ok(join([
            doc.doc_type.bucket_dir(),
            sanitize_folder_path(&doc.folder_path).as_str(),
            format!("{}.md", title).as_str(),
        ])),
    }
}

/// Directory owned by the chapter whose file is recorded at `chapter_path`
pub fn chapter_dir(chapter_path: &str) -> Option<&str> {
    chapter_path
        .strip_suffix(CHAPTER_FILE)?
        .strip_suffix('/')
        .filter(|dir| !dir.is_empty())
}

/// A scene's file inside the directory of the chapter recorded at
/// `chapter_path`
pub fn scene_path_in(chapter_path: &str, scene: &Document) -> Option<String> {
    chapter_dir(chapter_path).map(|dir| format!("{}/{}.md", dir, sanitize(&scene.title)))
}

/// [`derive_path`], except that a scene follows the directory its live
/// chapter's file occupies. The two differ when the chapter directory got
/// a collision suffix (`Chapter-1-1/`).
pub fn derive_placed_path(doc: &Document, index: &DocumentIndex) -> Result<String> {
    if doc.doc_type == DocumentType::Scene
        && let Some(chapter) = doc.parent_id.and_then(|id| index.get(&id))
        && chapter.doc_type == DocumentType::Chapter
        && !chapter.is_trashed()
        && let Some(placed) = scene_path_in(&chapter.content_file_path, doc)
    {
        return Ok(placed);
    }
    derive_path(doc, index)
}

/// Path used for a scene with no resolvable chapter
pub fn orphan_scene_path(doc: &Document) -> String {
    format!("{}/{}.md", ORPHAN_SCENE_DIR, sanitize(&doc.title))
}

/// [`derive_path`], falling back to [`orphan_scene_path`] for orphaned scenes.
///
/// Used where a file must be placed no matter what (save, trash).
pub fn derive_path_or_orphan(doc: &Document, index: &DocumentIndex) -> String {
    match derive_path(doc, index) {
        Ok(path) => path,
        Err(e) => {
            log::warn!("{}; placing it under {}/", e, ORPHAN_SCENE_DIR);
            orphan_scene_path(doc)
        }
    }
}

/// Join non-empty segments with `/`
fn join<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a project-relative path is under the trash prefix
pub fn is_trashed(path: &str) -> bool {
    path.get(..TRASH_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TRASH_PREFIX))
}

/// The path with the trash prefix removed, or `None` if it is not trashed
pub fn strip_trash_prefix(path: &str) -> Option<&str> {
    is_trashed(path).then(|| &path[TRASH_PREFIX.len()..])
}

/// The trashed location of a path, preserving its structure
pub fn to_trash_path(path: &str) -> String {
    if is_trashed(path) {
        path.to_string()
    } else {
        format!("{}{}", TRASH_PREFIX, path)
    }
}

/// Directory part of a relative path (`""` at the project root)
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a `/`-separated relative path against the project directory
/// using the host's separator.
pub fn resolve(project_dir: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .fold(project_dir.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Express a host path relative to the project directory with `/` separators.
///
/// Returns `None` if `full` cannot be expressed relative to the project.
pub fn to_relative(project_dir: &Path, full: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(full, project_dir)?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if segments.first().is_some_and(|s| s == "..") {
        return None;
    }
    Some(segments.join("/"))
}
