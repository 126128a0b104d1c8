//! Documents: the unit of writing in a project.
//!
//! A [`Document`] is a structural record (identity, type, hierarchy, order,
//! timestamps) plus a lazily loaded cache of its prose. The prose itself is
//! never serialized into the project index; it lives in the backing file at
//! `content_file_path`, relative to the project directory. The project
//! directory is always passed in explicitly.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{QuireError, Result};
use crate::fs::FileSystem;
use crate::path;
use crate::stats::TextStats;

/// Stable identity of a document. Assigned once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Allocate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The closed set of document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DocumentType {
    /// Manuscript chapter; owns a directory
    Chapter,
    /// Manuscript scene inside a chapter
    Scene,
    /// Loose note
    Note,
    /// Research material
    Research,
    /// Character sheet
    Character,
    /// Setting or place
    Location,
    /// Sequence of events
    Timeline,
    /// Plot thread
    Plot,
    /// Notable object
    Object,
    /// Organization, species or other entity
    Entity,
    /// Anything else
    Other,
}

impl DocumentType {
    /// Every type that owns a top-level bucket, in display order.
    /// Scenes live inside the Manuscript bucket with their chapters.
    pub const BUCKETS: [DocumentType; 10] = [
        DocumentType::Chapter,
        DocumentType::Character,
        DocumentType::Location,
        DocumentType::Research,
        DocumentType::Note,
        DocumentType::Timeline,
        DocumentType::Plot,
        DocumentType::Object,
        DocumentType::Entity,
        DocumentType::Other,
    ];

    /// The type whose bucket holds documents of this type
    pub fn bucket(self) -> DocumentType {
        match self {
            DocumentType::Scene => DocumentType::Chapter,
            other => other,
        }
    }

    /// Top-level directory of this type's files, relative to the project
    pub fn bucket_dir(self) -> &'static str {
        match self {
            DocumentType::Chapter | DocumentType::Scene => "Manuscript",
            DocumentType::Character => "characters",
            DocumentType::Location => "locations",
            DocumentType::Research => "research",
            DocumentType::Note => "notes",
            DocumentType::Timeline => "timelines",
            DocumentType::Plot => "plots",
            DocumentType::Object => "objects",
            DocumentType::Entity => "entities",
            DocumentType::Other => "other",
        }
    }

    /// Inverse of [`DocumentType::bucket_dir`] (case-insensitive)
    pub fn from_bucket_dir(dir: &str) -> Option<DocumentType> {
        DocumentType::BUCKETS
            .into_iter()
            .find(|t| t.bucket_dir().eq_ignore_ascii_case(dir))
    }

    /// Display name of this type's bucket node
    pub fn bucket_name(self) -> &'static str {
        match self {
            DocumentType::Chapter | DocumentType::Scene => "Manuscript",
            DocumentType::Character => "Characters",
            DocumentType::Location => "Locations",
            DocumentType::Research => "Research",
            DocumentType::Note => "Notes",
            DocumentType::Timeline => "Timelines",
            DocumentType::Plot => "Plots",
            DocumentType::Object => "Objects",
            DocumentType::Entity => "Entities",
            DocumentType::Other => "Other",
        }
    }

    /// Whether `folder_path` participates in this type's file path
    pub fn uses_folders(self) -> bool {
        !matches!(
            self,
            DocumentType::Scene | DocumentType::Note | DocumentType::Other
        )
    }

    /// Icon shown next to documents of this type
    pub fn icon(self) -> &'static str {
        match self {
            DocumentType::Chapter => "📖",
            DocumentType::Scene => "🎬",
            DocumentType::Note => "📝",
            DocumentType::Research => "🔎",
            DocumentType::Character => "👤",
            DocumentType::Location => "📍",
            DocumentType::Timeline => "🕒",
            DocumentType::Plot => "🧵",
            DocumentType::Object => "🗝",
            DocumentType::Entity => "✨",
            DocumentType::Other => "📄",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Chapter => "Chapter",
            DocumentType::Scene => "Scene",
            DocumentType::Note => "Note",
            DocumentType::Research => "Research",
            DocumentType::Character => "Character",
            DocumentType::Location => "Location",
            DocumentType::Timeline => "Timeline",
            DocumentType::Plot => "Plot",
            DocumentType::Object => "Object",
            DocumentType::Entity => "Entity",
            DocumentType::Other => "Other",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let all = DocumentType::BUCKETS
            .into_iter()
            .chain(std::iter::once(DocumentType::Scene));
        for t in all {
            if t.to_string().eq_ignore_ascii_case(s) || t.bucket_dir().eq_ignore_ascii_case(s) {
                return Ok(t);
            }
        }
        Err(format!("unknown document type '{}'", s))
    }
}

/// One unit of writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable identity
    pub id: DocumentId,

    /// Display name
    pub title: String,

    /// Kind of document
    #[serde(rename = "type")]
    pub doc_type: DocumentType,

    /// Owning chapter for scenes, `None` otherwise
    #[serde(default)]
    pub parent_id: Option<DocumentId>,

    /// `/`-separated folder inside the type bucket; empty means the bucket root
    #[serde(default)]
    pub folder_path: String,

    /// Project-relative path of the backing file, `/`-separated; empty until first save
    #[serde(default)]
    pub content_file_path: String,

    /// Sibling order, lower first
    #[serde(default)]
    pub order: i32,

    /// When the document was added
    pub created: DateTime<Utc>,

    /// Last title, structure or content change
    pub modified: DateTime<Utc>,

    /// Cached prose. Older project files inlined it, so it is still accepted
    /// on read but never written back.
    #[serde(default, skip_serializing)]
    content: String,

    /// Path the backing file had before its `content_file_path` was cleared
    #[serde(skip)]
    previous_path: Option<String>,
}

impl Document {
    /// Create a document with no backing file yet
    pub fn new(title: impl Into<String>, doc_type: DocumentType) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            title: title.into(),
            doc_type,
            parent_id: None,
            folder_path: String::new(),
            content_file_path: String::new(),
            order: 0,
            created: now,
            modified: now,
            content: String::new(),
            previous_path: None,
        }
    }

    /// Builder: set the parent chapter
    pub fn with_parent(mut self, parent: DocumentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Builder: set the folder path
    pub fn with_folder(mut self, folder_path: impl Into<String>) -> Self {
        self.folder_path = folder_path.into();
        self
    }

    /// Builder: seed the content cache
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Whether the backing file lives under the trash prefix
    pub fn is_trashed(&self) -> bool {
        path::is_trashed(&self.content_file_path)
    }

    /// Whether a path has been assigned
    pub fn has_path(&self) -> bool {
        !self.content_file_path.is_empty()
    }

    /// The cached content, without touching disk
    pub fn cached_content(&self) -> &str {
        &self.content
    }

    /// Absolute location of the backing file, if a path is assigned
    pub fn full_path(&self, project_dir: &Path) -> Option<std::path::PathBuf> {
        self.has_path()
            .then(|| path::resolve(project_dir, &self.content_file_path))
    }

    /// Clears the path so the next save derives it again, remembering
    /// where the file currently is.
    pub fn clear_path(&mut self) {
        if self.has_path() {
            self.previous_path = Some(std::mem::take(&mut self.content_file_path));
        }
    }

    /// Path recorded by [`Document::clear_path`], consumed on read
    pub(crate) fn take_previous_path(&mut self) -> Option<String> {
        self.previous_path.take()
    }

    /// Load the content, propagating read failures.
    ///
    /// A non-empty cache wins. An empty cache is refilled from the backing
    /// file if one exists. A missing file, or an unassigned path, is empty
    /// content rather than an error.
    pub fn load_content<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> Result<&str> {
        if !self.content.is_empty() {
            return Ok(&self.content);
        }
        let Some(full) = self.full_path(project_dir) else {
            return Ok(&self.content);
        };
        if !fs.exists(&full) {
            return Ok(&self.content);
        }

        self.content.clear();
        self.content = fs
            .read_to_string(&full)
            .map_err(|e| QuireError::FileRead {
                path: full.clone(),
                source: e,
            })?;
        log::debug!("Loaded {} bytes from {:?}", self.content.len(), full);
        Ok(&self.content)
    }

    /// Content as the editing surface sees it: any read failure degrades to
    /// empty content and is logged.
    pub fn get_content<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> String {
        match self.load_content(fs, project_dir) {
            Ok(content) => content.to_string(),
            Err(e) => {
                log::warn!("Could not load content of '{}': {}", self.title, e);
                String::new()
            }
        }
    }

    /// Replace the cached content. Never touches disk.
    pub fn set_content(&mut self, text: impl Into<String>) {
        self.content = text.into();
    }

    /// Write the current content to the backing file.
    ///
    /// No-op while no path is assigned. Creates intermediate directories and
    /// stamps the modified time.
    pub fn flush<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> Result<()> {
        let Some(full) = self.full_path(project_dir) else {
            return Ok(());
        };

        let content = self.load_content(fs, project_dir)?.to_string();

        if let Some(parent) = full.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.write_file(&full, &content)
            .map_err(|e| QuireError::FileWrite {
                path: full.clone(),
                source: e,
            })?;
        self.modified = Utc::now();
        Ok(())
    }

    /// Text statistics, loading content if needed
    pub fn stats<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> TextStats {
        TextStats::from_text(&self.get_content(fs, project_dir))
    }

    /// Word count, loading content if needed
    pub fn word_count<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> usize {
        self.stats(fs, project_dir).words
    }

    /// Character count, loading content if needed
    pub fn character_count<FS: FileSystem>(&mut self, fs: &FS, project_dir: &Path) -> usize {
        self.stats(fs, project_dir).characters
    }

    /// Character count excluding whitespace, loading content if needed
    pub fn character_count_no_spaces<FS: FileSystem>(
        &mut self,
        fs: &FS,
        project_dir: &Path,
    ) -> usize {
        self.stats(fs, project_dir).characters_no_spaces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use crate::test_utils::FaultyFileSystem;
    use std::path::PathBuf;

    fn project_dir() -> PathBuf {
        PathBuf::from("/novel")
    }

    #[test]
    fn test_content_without_path_is_empty() {
        let fs = InMemoryFileSystem::new();
        let mut doc = Document::new("Loose", DocumentType::Note);
        assert_eq!(doc.get_content(&fs, &project_dir()), "");
    }

    #[test]
    fn test_cached_content_wins_over_disk() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("/novel/notes/Idea.md"), "on disk")
            .unwrap();

        let mut doc = Document::new("Idea", DocumentType::Note).with_content("in memory");
        doc.content_file_path = "notes/Idea.md".to_string();

        assert_eq!(doc.get_content(&fs, &project_dir()), "in memory");
    }

    #[test]
    fn test_empty_cache_reloads_from_disk() {
        let fs = InMemoryFileSystem::new();
        let mut doc = Document::new("Idea", DocumentType::Note);
        doc.content_file_path = "notes/Idea.md".to_string();

        // Placeholder first, file populated later
        assert_eq!(doc.get_content(&fs, &project_dir()), "");
        fs.write_file(Path::new("/novel/notes/Idea.md"), "written elsewhere")
            .unwrap();
        assert_eq!(doc.get_content(&fs, &project_dir()), "written elsewhere");
    }

    #[test]
    fn test_set_content_does_not_touch_disk() {
        let fs = InMemoryFileSystem::new();
        let mut doc = Document::new("Idea", DocumentType::Note);
        doc.content_file_path = "notes/Idea.md".to_string();
        doc.set_content("draft");

        assert!(fs.list_all_files().is_empty());
    }

    #[test]
    fn test_flush_creates_directories_and_stamps_modified() {
        let fs = InMemoryFileSystem::new();
        let mut doc = Document::new("Mira", DocumentType::Character).with_content("Tall.");
        doc.content_file_path = "characters/Leads/Mira.md".to_string();
        let before = doc.modified;

        doc.flush(&fs, &project_dir()).unwrap();

        assert!(fs.is_dir(Path::new("/novel/characters/Leads")));
        assert_eq!(
            fs.read_to_string(Path::new("/novel/characters/Leads/Mira.md"))
                .unwrap(),
            "Tall."
        );
        assert!(doc.modified >= before);
    }

    #[test]
    fn test_flush_without_path_is_noop() {
        let fs = InMemoryFileSystem::new();
        let mut doc = Document::new("Mira", DocumentType::Character).with_content("Tall.");
        doc.flush(&fs, &project_dir()).unwrap();
        assert!(fs.list_all_files().is_empty());
    }

    #[test]
    fn test_read_failure_degrades_to_empty_but_is_observable() {
        let inner = InMemoryFileSystem::new();
        inner
            .write_file(Path::new("/novel/notes/Idea.md"), "text")
            .unwrap();
        let fs = FaultyFileSystem::new(inner).fail_reads();

        let mut doc = Document::new("Idea", DocumentType::Note);
        doc.content_file_path = "notes/Idea.md".to_string();

        assert!(matches!(
            doc.load_content(&fs, &project_dir()),
            Err(QuireError::FileRead { .. })
        ));
        assert_eq!(doc.get_content(&fs, &project_dir()), "");
    }

    #[test]
    fn test_stats_force_lazy_load() {
        let fs = InMemoryFileSystem::new();
        fs.write_file(Path::new("/novel/notes/Idea.md"), "Two words")
            .unwrap();
        let mut doc = Document::new("Idea", DocumentType::Note);
        doc.content_file_path = "notes/Idea.md".to_string();

        assert_eq!(doc.word_count(&fs, &project_dir()), 2);
        assert_eq!(doc.character_count(&fs, &project_dir()), 9);
        assert_eq!(doc.character_count_no_spaces(&fs, &project_dir()), 8);
        assert_eq!(doc.cached_content(), "Two words");
    }

    #[test]
    fn test_serialization_excludes_content() {
        let doc = Document::new("Secret", DocumentType::Note).with_content("hidden prose");
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("hidden prose"));
        assert!(json.contains("\"type\":\"Note\""));
    }

    #[test]
    fn test_legacy_inline_content_is_read() {
        let id = DocumentId::new();
        let json = format!(
            concat!(
                r#"{{"id":"{}","title":"Old","type":"Note","#,
                r#""created":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z","#,
                r#""content":"inline"}}"#
            ),
            id
        );
        let doc: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.cached_content(), "inline");
        assert!(!doc.has_path());
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!("chapter".parse::<DocumentType>(), Ok(DocumentType::Chapter));
        assert_eq!(
            "characters".parse::<DocumentType>(),
            Ok(DocumentType::Character)
        );
        assert_eq!("Scene".parse::<DocumentType>(), Ok(DocumentType::Scene));
        assert!("dragon".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_bucket_dir_round_trip() {
        for t in DocumentType::BUCKETS {
            assert_eq!(DocumentType::from_bucket_dir(t.bucket_dir()), Some(t));
        }
    }
}
