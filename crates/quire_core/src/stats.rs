//! Word, character, paragraph and sentence counts.
//!
//! [`TextStats`] counts a single text; [`aggregate`] walks a project's
//! active documents, forcing lazy loads, and sums them into
//! [`ProjectStatistics`].

use std::ops::AddAssign;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentType};
use crate::fs::FileSystem;

/// Counts for one piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    /// Whitespace-separated words
    pub words: usize,
    /// Unicode scalar values
    pub characters: usize,
    /// Characters that are not whitespace
    pub characters_no_spaces: usize,
    /// Blocks separated by blank lines
    pub paragraphs: usize,
    /// Runs ending in `.`, `!` or `?`
    pub sentences: usize,
}

impl TextStats {
    /// Count a text
    pub fn from_text(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.chars().count(),
            characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
            paragraphs: count_paragraphs(text),
            sentences: count_sentences(text),
        }
    }
}

impl AddAssign for TextStats {
    fn add_assign(&mut self, rhs: Self) {
        self.words += rhs.words;
        self.characters += rhs.characters;
        self.characters_no_spaces += rhs.characters_no_spaces;
        self.paragraphs += rhs.paragraphs;
        self.sentences += rhs.sentences;
    }
}

/// Paragraphs are runs of non-blank lines separated by blank lines.
fn count_paragraphs(text: &str) -> usize {
    let mut count = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            in_paragraph = true;
            count += 1;
        }
    }
    count
}

/// A sentence ends at a run of `.`, `!` or `?`; trailing text without a
/// terminator still counts as one.
fn count_sentences(text: &str) -> usize {
    let mut count = 0;
    let mut has_words = false;
    for c in text.chars() {
        if matches!(c, '.' | '!' | '?') {
            if has_words {
                count += 1;
                has_words = false;
            }
        } else if c.is_alphanumeric() {
            has_words = true;
        }
    }
    if has_words {
        count += 1;
    }
    count
}

/// Project-wide totals over active (non-trashed) documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatistics {
    /// Counts summed over every active document
    #[serde(flatten)]
    pub totals: TextStats,
    /// Active documents counted
    pub document_count: usize,
    /// Words in chapters and scenes only
    pub manuscript_words: usize,
}

/// Sum statistics over every active document, loading content as needed.
pub fn aggregate<FS: FileSystem>(
    documents: &mut [Document],
    fs: &FS,
    project_dir: &Path,
) -> ProjectStatistics {
    let mut stats = ProjectStatistics::default();
    for doc in documents.iter_mut().filter(|d| !d.is_trashed()) {
        let doc_stats = doc.stats(fs, project_dir);
        if matches!(doc.doc_type, DocumentType::Chapter | DocumentType::Scene) {
            stats.manuscript_words += doc_stats.words;
        }
        stats.totals += doc_stats;
        stats.document_count += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFileSystem;
    use std::path::PathBuf;

    #[test]
    fn test_text_stats() {
        let text = "It was late. The harbor slept!\n\nWho knew?  Nobody";
        let stats = TextStats::from_text(text);
        assert_eq!(stats.words, 9);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.sentences, 4);
        assert_eq!(stats.characters, text.chars().count());
        assert_eq!(
            stats.characters_no_spaces,
            text.chars().filter(|c| !c.is_whitespace()).count()
        );
    }

    #[test]
    fn test_ellipsis_is_one_sentence_end() {
        assert_eq!(count_sentences("Wait... what?!"), 2);
        assert_eq!(count_sentences("..."), 0);
        assert_eq!(count_sentences(""), 0);
    }

    #[test]
    fn test_aggregate_skips_trashed_and_forces_loads() {
        let fs = InMemoryFileSystem::new();
        let dir = PathBuf::from("/novel");
        fs.write_file(&dir.join("notes/Lazy.md"), "one two three")
            .unwrap();

        let mut lazy = Document::new("Lazy", DocumentType::Note);
        lazy.content_file_path = "notes/Lazy.md".to_string();
        let chapter = Document::new("Chapter 1", DocumentType::Chapter)
            .with_content("Four words right here.");
        let mut trashed = Document::new("Gone", DocumentType::Note).with_content("not counted");
        trashed.content_file_path = "Trashcan/notes/Gone.md".to_string();

        let mut docs = vec![lazy, chapter, trashed];
        let stats = aggregate(&mut docs, &fs, &dir);

        assert_eq!(stats.document_count, 2);
        assert_eq!(stats.totals.words, 7);
        assert_eq!(stats.manuscript_words, 4);
    }
}
