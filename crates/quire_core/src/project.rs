//! Projects and structural edits on the flat document list.
//!
//! A [`Project`] owns every [`Document`] in one ordered list. Edits here only
//! mutate that list (title, parent, folder, order). None of them touch disk:
//! the next [`save`](crate::store::ProjectStore::save) notices that a
//! document's canonical path changed and moves its file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentId, DocumentType};
use crate::error::{QuireError, Result};
use crate::path::{self, DocumentIndex};
use crate::stats::ProjectStatistics;

/// Extension of project index files
pub const PROJECT_EXTENSION: &str = "quire";

/// Project-level metadata. Opaque to the path and sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Working title of the book
    #[serde(default)]
    pub title: String,

    /// Author name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Target manuscript length in words
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_target: Option<usize>,

    /// Date the draft is due
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,

    /// Refreshed on every save
    #[serde(default)]
    pub statistics: ProjectStatistics,

    /// Free-form settings owned by the front end
    #[serde(default)]
    pub settings: IndexMap<String, serde_json::Value>,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// Last save
    pub modified: DateTime<Utc>,

    /// Last load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Fresh metadata stamped with the current time
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            author: None,
            word_target: None,
            deadline: None,
            statistics: ProjectStatistics::default(),
            settings: IndexMap::new(),
            created: now,
            modified: now,
            last_opened: None,
        }
    }
}

/// A writing project: a name, its index file, its documents and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display name
    pub name: String,

    /// Location of the project index file
    #[serde(default)]
    pub path: PathBuf,

    /// Every document, trashed ones included, in a flat list
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Absent in very old project files; filled in on load
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl Project {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            metadata: Some(Metadata::new(name.clone())),
            name,
            path: PathBuf::new(),
            documents: Vec::new(),
        }
    }

    /// Create a project seeded with one chapter and scene, a character,
    /// a location and a note.
    pub fn with_sample_content(name: impl Into<String>) -> Self {
        let mut project = Self::new(name);

        let chapter = Document::new("Chapter 1", DocumentType::Chapter)
            .with_content("# Chapter 1\n\nA short summary of what happens in this chapter.\n");
        let scene = Document::new("Scene 1", DocumentType::Scene)
            .with_parent(chapter.id)
            .with_content("The story begins here.\n");
        let character = Document::new("Protagonist", DocumentType::Character)
            .with_content("# Protagonist\n\n**Role:** Main character\n\n**Goal:**\n\n**Flaw:**\n");
        let location = Document::new("Hometown", DocumentType::Location)
            .with_content("# Hometown\n\nWhere the story starts.\n");
        let note = Document::new("Ideas", DocumentType::Note)
            .with_content("- Loose ideas go here\n");

        project.documents = vec![chapter, scene, character, location, note];
        project
    }

    /// Directory that document paths are relative to
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Metadata, created on first access if missing
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        let title = self.name.clone();
        self.metadata.get_or_insert_with(|| Metadata::new(title))
    }

    /// Id lookup over the current document list
    pub fn index(&self) -> DocumentIndex<'_> {
        path::index_documents(&self.documents)
    }

    /// Find a document by id
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Find a document by id, mutably
    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Find a document by id or fail with [`QuireError::DocumentNotFound`]
    pub fn require(&self, id: DocumentId) -> Result<&Document> {
        self.document(id).ok_or(QuireError::DocumentNotFound(id))
    }

    pub(crate) fn position(&self, id: DocumentId) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d.id == id)
            .ok_or(QuireError::DocumentNotFound(id))
    }

    /// Active scenes of a chapter, in sibling order
    pub fn scenes_of(&self, chapter: DocumentId) -> Vec<&Document> {
        let mut scenes: Vec<&Document> = self
            .documents
            .iter()
            .filter(|d| d.doc_type == DocumentType::Scene && d.parent_id == Some(chapter))
            .collect();
        scenes.sort_by(|a, b| a.order.cmp(&b.order).then(a.created.cmp(&b.created)));
        scenes
    }

    /// Check that `parent` is a valid parent for a document of `doc_type`.
    pub(crate) fn validate_parent(
        &self,
        doc_type: DocumentType,
        parent: Option<DocumentId>,
    ) -> Result<()> {
        match (doc_type, parent) {
            (DocumentType::Scene, None) => Err(QuireError::MissingParent),
            (DocumentType::Scene, Some(id)) => {
                let parent = self.require(id)?;
                if parent.doc_type != DocumentType::Chapter || parent.is_trashed() {
                    return Err(QuireError::InvalidParent {
                        parent: id,
                        kind: doc_type,
                    });
                }
                Ok(())
            }
            (_, Some(id)) => Err(QuireError::InvalidParent {
                parent: id,
                kind: doc_type,
            }),
            (_, None) => Ok(()),
        }
    }

    /// Order value that places a new document after its siblings
    fn next_order(&self, doc_type: DocumentType, parent: Option<DocumentId>, folder: &str) -> i32 {
        self.documents
            .iter()
            .filter(|d| !d.is_trashed() && d.doc_type == doc_type)
            .filter(|d| d.parent_id == parent && d.folder_path == folder)
            .map(|d| d.order)
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Add a new document after its siblings.
    ///
    /// Rejects blank titles, scenes without a live chapter as parent, and
    /// parents on anything but scenes. Nothing is written to disk.
    pub fn add_document(
        &mut self,
        title: &str,
        doc_type: DocumentType,
        parent: Option<DocumentId>,
        folder_path: &str,
    ) -> Result<DocumentId> {
        let title = normalize_title(title)?;
        self.validate_parent(doc_type, parent)?;

        let folder = normalize_folder(doc_type, folder_path);
        let mut doc = Document::new(title, doc_type).with_folder(folder.clone());
        doc.parent_id = parent;
        doc.order = self.next_order(doc_type, parent, &folder);

        let id = doc.id;
        log::debug!("Added {} '{}' ({})", doc_type, doc.title, id);
        self.documents.push(doc);
        Ok(id)
    }

    /// Change a document's title. The file follows on the next save.
    pub fn rename_document(&mut self, id: DocumentId, new_title: &str) -> Result<()> {
        let title = normalize_title(new_title)?;
        let doc = self
            .document_mut(id)
            .ok_or(QuireError::DocumentNotFound(id))?;
        doc.title = title;
        doc.modified = Utc::now();
        Ok(())
    }

    /// Move a document to another folder (or, for scenes, another chapter).
    ///
    /// The document is appended after its new siblings. The file follows on
    /// the next save.
    pub fn move_document(
        &mut self,
        id: DocumentId,
        parent: Option<DocumentId>,
        folder_path: &str,
    ) -> Result<()> {
        let doc_type = self.require(id)?.doc_type;
        if parent == Some(id) {
            return Err(QuireError::InvalidParent {
                parent: id,
                kind: doc_type,
            });
        }
        self.validate_parent(doc_type, parent)?;

        let folder = normalize_folder(doc_type, folder_path);
        let order = self.next_order(doc_type, parent, &folder);
        let doc = self
            .document_mut(id)
            .ok_or(QuireError::DocumentNotFound(id))?;
        doc.parent_id = parent;
        doc.folder_path = folder;
        doc.order = order;
        doc.modified = Utc::now();
        Ok(())
    }

    /// Move a document to `index` among its siblings and renumber them.
    pub fn reorder_document(&mut self, id: DocumentId, index: usize) -> Result<()> {
        let (doc_type, parent, folder) = {
            let doc = self.require(id)?;
            (doc.doc_type, doc.parent_id, doc.folder_path.clone())
        };

        let mut siblings: Vec<(i32, DateTime<Utc>, DocumentId)> = self
            .documents
            .iter()
            .filter(|d| !d.is_trashed() && d.doc_type == doc_type)
            .filter(|d| d.parent_id == parent && d.folder_path == folder)
            .map(|d| (d.order, d.created, d.id))
            .collect();
        siblings.sort();

        let current = siblings
            .iter()
            .position(|(_, _, sid)| *sid == id)
            .ok_or(QuireError::DocumentNotFound(id))?;
        let entry = siblings.remove(current);
        siblings.insert(index.min(siblings.len()), entry);

        for (order, (_, _, sid)) in siblings.into_iter().enumerate() {
            if let Some(doc) = self.document_mut(sid) {
                doc.order = order as i32;
            }
        }
        Ok(())
    }
}

/// Trim a title and reject it if blank
fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(QuireError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Types whose path ignores folders never carry one; others keep a tidy `/` path
pub(crate) fn normalize_folder(doc_type: DocumentType, folder_path: &str) -> String {
    if !doc_type.uses_folders() {
        return String::new();
    }
    folder_path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_content_is_linked() {
        let project = Project::with_sample_content("Novel");
        let chapter = &project.documents[0];
        let scene = &project.documents[1];
        assert_eq!(chapter.doc_type, DocumentType::Chapter);
        assert_eq!(scene.parent_id, Some(chapter.id));
        assert_eq!(project.scenes_of(chapter.id).len(), 1);
    }

    #[test]
    fn test_add_document_validates_input() {
        let mut project = Project::new("Novel");

        assert!(matches!(
            project.add_document("   ", DocumentType::Note, None, ""),
            Err(QuireError::EmptyTitle)
        ));
        assert!(matches!(
            project.add_document("Scene", DocumentType::Scene, None, ""),
            Err(QuireError::MissingParent)
        ));

        let note = project
            .add_document("Note", DocumentType::Note, None, "")
            .unwrap();
        assert!(matches!(
            project.add_document("Scene", DocumentType::Scene, Some(note), ""),
            Err(QuireError::InvalidParent { .. })
        ));
        assert!(matches!(
            project.add_document("Chapter", DocumentType::Chapter, Some(note), ""),
            Err(QuireError::InvalidParent { .. })
        ));

        // Rejections leave the list untouched
        assert_eq!(project.documents.len(), 1);
    }

    #[test]
    fn test_add_document_appends_after_siblings() {
        let mut project = Project::new("Novel");
        let ch = project
            .add_document(" Chapter 1 ", DocumentType::Chapter, None, "")
            .unwrap();
        let s1 = project
            .add_document("Scene 1", DocumentType::Scene, Some(ch), "ignored")
            .unwrap();
        let s2 = project
            .add_document("Scene 2", DocumentType::Scene, Some(ch), "")
            .unwrap();

        assert_eq!(project.require(ch).unwrap().title, "Chapter 1");
        assert_eq!(project.require(s1).unwrap().order, 0);
        assert_eq!(project.require(s1).unwrap().folder_path, "");
        assert_eq!(project.require(s2).unwrap().order, 1);
    }

    #[test]
    fn test_rename_does_not_touch_path() {
        let mut project = Project::with_sample_content("Novel");
        let id = project.documents[2].id;
        project.documents[2].content_file_path = "characters/Protagonist.md".into();

        project.rename_document(id, "Mira").unwrap();
        let doc = project.require(id).unwrap();
        assert_eq!(doc.title, "Mira");
        assert_eq!(doc.content_file_path, "characters/Protagonist.md");

        assert!(matches!(
            project.rename_document(id, ""),
            Err(QuireError::EmptyTitle)
        ));
    }

    #[test]
    fn test_move_scene_to_other_chapter() {
        let mut project = Project::new("Novel");
        let ch1 = project
            .add_document("One", DocumentType::Chapter, None, "")
            .unwrap();
        let ch2 = project
            .add_document("Two", DocumentType::Chapter, None, "")
            .unwrap();
        let scene = project
            .add_document("Scene", DocumentType::Scene, Some(ch1), "")
            .unwrap();

        project.move_document(scene, Some(ch2), "").unwrap();
        assert_eq!(project.require(scene).unwrap().parent_id, Some(ch2));

        assert!(project.move_document(scene, None, "").is_err());
        assert!(project.move_document(ch1, Some(ch1), "").is_err());
    }

    #[test]
    fn test_move_to_folder_normalizes_path() {
        let mut project = Project::new("Novel");
        let id = project
            .add_document("Mira", DocumentType::Character, None, "")
            .unwrap();
        project.move_document(id, None, " Leads / Heroes/ ").unwrap();
        assert_eq!(project.require(id).unwrap().folder_path, "Leads/Heroes");
    }

    #[test]
    fn test_reorder_renumbers_siblings() {
        let mut project = Project::new("Novel");
        let a = project
            .add_document("A", DocumentType::Note, None, "")
            .unwrap();
        let b = project
            .add_document("B", DocumentType::Note, None, "")
            .unwrap();
        let c = project
            .add_document("C", DocumentType::Note, None, "")
            .unwrap();

        project.reorder_document(c, 0).unwrap();

        let order = |id| project.require(id).unwrap().order;
        assert_eq!((order(c), order(a), order(b)), (0, 1, 2));
    }

    #[test]
    fn test_directory_is_parent_of_index_file() {
        let mut project = Project::new("Novel");
        project.path = PathBuf::from("/books/novel/Novel.quire");
        assert_eq!(project.directory(), Path::new("/books/novel"));
    }
}
