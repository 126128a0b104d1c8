//! Display tree built from the flat document list.
//!
//! The tree is derived data: it is rebuilt from scratch after every
//! structural edit and never persisted. Nodes refer to documents by id only.
//!
//! ```text
//! Novel
//! ├── Manuscript
//! │   ├── Part 1              (folder)
//! │   │   └── Chapter 2
//! │   └── Chapter 1
//! │       └── Scene 1
//! ├── Characters
//! ├── ...
//! └── Trashcan
//!     └── Manuscript          (folder, from the trashed path)
//!         └── Chapter-3
//!             └── Chapter 3
//! ```

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::document::{Document, DocumentId, DocumentType};
use crate::path::{self, TRASH_DIR};
use crate::project::Project;

/// What a tree node stands for. Exactly one root and one trash node exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NodeKind {
    /// The project itself
    Root,
    /// Top-level bucket of one document type (Manuscript for chapters)
    Bucket(DocumentType),
    /// The trash
    Trash,
    /// Synthetic folder derived from folder paths or trashed paths
    Folder,
    /// A document
    Document,
}

/// Node in the project tree (for display purposes)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Display name (document title or folder segment)
    pub name: String,
    /// Emoji shown before the name
    pub icon: String,
    /// What the node stands for
    pub kind: NodeKind,
    /// Set on document nodes
    #[ts(type = "string | null")]
    pub document_id: Option<DocumentId>,
    /// Project-relative folder: the folder path within the bucket for
    /// bucket folders, the full `Trashcan/...` directory for trash folders
    pub folder_path: Option<String>,
    /// Bucket type this folder belongs to
    pub folder_type: Option<DocumentType>,
    /// Child nodes in display order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn special(name: &str, icon: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
            kind,
            document_id: None,
            folder_path: None,
            folder_type: None,
            children: Vec::new(),
        }
    }

    fn folder(name: &str, folder_path: String, folder_type: Option<DocumentType>) -> Self {
        Self {
            name: name.to_string(),
            icon: "📁".to_string(),
            kind: NodeKind::Folder,
            document_id: None,
            folder_path: Some(folder_path),
            folder_type,
            children: Vec::new(),
        }
    }

    fn leaf(doc: &Document) -> Self {
        Self {
            name: doc.title.clone(),
            icon: doc.doc_type.icon().to_string(),
            kind: NodeKind::Document,
            document_id: Some(doc.id),
            folder_path: None,
            folder_type: None,
            children: Vec::new(),
        }
    }

    /// Whether this is a folder node
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Depth-first search for a node
    pub fn find(&self, predicate: &dyn Fn(&TreeNode) -> bool) -> Option<&TreeNode> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(predicate))
    }

    /// The node of a document
    pub fn find_document(&self, id: DocumentId) -> Option<&TreeNode> {
        self.find(&|node| node.document_id == Some(id))
    }

    /// The bucket node of a type
    pub fn bucket(&self, doc_type: DocumentType) -> Option<&TreeNode> {
        let bucket = doc_type.bucket();
        self.find(&|node| node.kind == NodeKind::Bucket(bucket))
    }

    /// The trash node
    pub fn trash(&self) -> Option<&TreeNode> {
        self.find(&|node| node.kind == NodeKind::Trash)
    }

    /// Every document id in the subtree, in display order
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<DocumentId>) {
        if let Some(id) = self.document_id {
            ids.push(id);
        }
        for child in &self.children {
            child.collect_ids(ids);
        }
    }
}

/// Build the display tree of a project
pub fn build_tree(project: &Project) -> TreeNode {
    build_tree_from(&project.name, &project.documents)
}

/// Build the display tree from a flat document list.
///
/// Documents whose path starts with the trash prefix go under the trash node,
/// arranged by their trashed paths; everything else goes into its bucket.
pub fn build_tree_from(name: &str, documents: &[Document]) -> TreeNode {
    let (trashed, active): (Vec<&Document>, Vec<&Document>) =
        documents.iter().partition(|d| d.is_trashed());

    let mut root = TreeNode::special(name, "🗂", NodeKind::Root);
    root.children.push(build_manuscript(&active));

    for bucket in DocumentType::BUCKETS
        .into_iter()
        .filter(|t| *t != DocumentType::Chapter)
    {
        let docs: Vec<&Document> = active
            .iter()
            .copied()
            .filter(|d| d.doc_type == bucket)
            .collect();

        let mut node = TreeNode::special(
            bucket.bucket_name(),
            bucket.icon(),
            NodeKind::Bucket(bucket),
        );
        node.children = build_folders(
            bucket,
            "",
            entries(&docs),
            &|doc| TreeNode::leaf(doc),
            by_order_then_title,
            by_order_then_title,
        );
        root.children.push(node);
    }

    root.children.push(build_trash(&trashed));
    root
}

type Entry<'a> = (&'a Document, Vec<&'a str>);

/// Pair each document with its folder segments
fn entries<'a>(docs: &[&'a Document]) -> Vec<Entry<'a>> {
    docs.iter()
        .map(|&doc| {
            let segments = doc
                .folder_path
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (doc, segments)
        })
        .collect()
}

fn by_created(a: &&Document, b: &&Document) -> Ordering {
    a.created.cmp(&b.created)
}

fn by_order_then_created(a: &&Document, b: &&Document) -> Ordering {
    a.order.cmp(&b.order).then(a.created.cmp(&b.created))
}

fn by_order_then_title(a: &&Document, b: &&Document) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

/// Lay out one level of a bucket: subfolders (by name) then documents.
///
/// `root_order` sorts documents directly in the bucket, `folder_order`
/// sorts documents inside subfolders.
fn build_folders<'a>(
    bucket: DocumentType,
    prefix: &str,
    entries: Vec<Entry<'a>>,
    leaf: &dyn Fn(&'a Document) -> TreeNode,
    root_order: fn(&&Document, &&Document) -> Ordering,
    folder_order: fn(&&Document, &&Document) -> Ordering,
) -> Vec<TreeNode> {
    let mut direct: Vec<&'a Document> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<Entry<'a>>> = BTreeMap::new();

    for (doc, segments) in entries {
        match segments.split_first() {
            None => direct.push(doc),
            Some((first, rest)) => groups.entry(*first).or_default().push((doc, rest.to_vec())),
        }
    }

    let mut nodes = Vec::new();
    for (segment, members) in groups {
        let folder_path = if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", prefix, segment)
        };
        let mut folder = TreeNode::folder(segment, folder_path.clone(), Some(bucket));
        folder.children = build_folders(
            bucket,
            &folder_path,
            members,
            leaf,
            folder_order,
            folder_order,
        );
        nodes.push(folder);
    }

    direct.sort_by(root_order);
    nodes.extend(direct.into_iter().map(leaf));
    nodes
}

/// Manuscript bucket: chapters (nesting their scenes) plus any scenes whose
/// chapter is not active.
fn build_manuscript(active: &[&Document]) -> TreeNode {
    let chapters: Vec<&Document> = active
        .iter()
        .copied()
        .filter(|d| d.doc_type == DocumentType::Chapter)
        .collect();
    let scenes: Vec<&Document> = active
        .iter()
        .copied()
        .filter(|d| d.doc_type == DocumentType::Scene)
        .collect();
    let chapter_ids: HashSet<DocumentId> = chapters.iter().map(|c| c.id).collect();

    let chapter_node = |chapter: &Document| {
        let mut node = TreeNode::leaf(chapter);
        let mut own: Vec<&Document> = scenes
            .iter()
            .copied()
            .filter(|s| s.parent_id == Some(chapter.id))
            .collect();
        own.sort_by(by_order_then_created);
        node.children = own.into_iter().map(TreeNode::leaf).collect();
        node
    };

    let mut manuscript = TreeNode::special(
        DocumentType::Chapter.bucket_name(),
        "📚",
        NodeKind::Bucket(DocumentType::Chapter),
    );
    manuscript.children = build_folders(
        DocumentType::Chapter,
        "",
        entries(&chapters),
        &chapter_node,
        by_created,
        by_order_then_created,
    );

    let mut orphans: Vec<&Document> = scenes
        .into_iter()
        .filter(|s| !s.parent_id.is_some_and(|p| chapter_ids.contains(&p)))
        .collect();
    orphans.sort_by(by_order_then_created);
    manuscript
        .children
        .extend(orphans.into_iter().map(TreeNode::leaf));

    manuscript
}

/// Intermediate trash folder, keyed by segment so repeated prefixes share a node
#[derive(Default)]
struct TrashFolder<'a> {
    folders: BTreeMap<&'a str, TrashFolder<'a>>,
    documents: Vec<&'a Document>,
}

fn build_trash<'a>(trashed: &[&'a Document]) -> TreeNode {
    let mut root: TrashFolder<'a> = TrashFolder::default();

    for &doc in trashed {
        let relative = path::strip_trash_prefix(&doc.content_file_path).unwrap_or("");
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let folders = segments.split_last().map_or(&[][..], |(_, dirs)| dirs);

        let mut current = &mut root;
        for segment in folders {
            current = current.folders.entry(*segment).or_default();
        }
        current.documents.push(doc);
    }

    let mut trash = TreeNode::special(TRASH_DIR, "🗑", NodeKind::Trash);
    trash.children = trash_children(root, TRASH_DIR, None);
    trash
}

/// Convert a trash folder into nodes: folders first, then documents, both
/// alphabetical. Folders left without children are dropped.
fn trash_children(
    folder: TrashFolder<'_>,
    dir: &str,
    folder_type: Option<DocumentType>,
) -> Vec<TreeNode> {
    let mut folders: Vec<TreeNode> = Vec::new();
    for (segment, sub) in folder.folders {
        let sub_dir = format!("{}/{}", dir, segment);
        let sub_type = folder_type.or_else(|| DocumentType::from_bucket_dir(segment));
        let children = trash_children(sub, &sub_dir, sub_type);
        if children.is_empty() {
            continue;
        }
        let mut node = TreeNode::folder(segment, sub_dir, sub_type);
        node.children = children;
        folders.push(node);
    }
    folders.sort_by_key(|n| n.name.to_lowercase());

    let mut documents = folder.documents;
    documents.sort_by_key(|d| d.title.to_lowercase());

    folders
        .into_iter()
        .chain(documents.into_iter().map(TreeNode::leaf))
        .collect()
}

/// Render a tree with box-drawing connectors (like the `tree` command)
pub fn format_tree(node: &TreeNode) -> String {
    let mut result = String::new();
    format_tree_node(node, "", &mut result);
    result
}

fn format_tree_node(node: &TreeNode, prefix: &str, out: &mut String) {
    out.push_str(&node.icon);
    out.push(' ');
    out.push_str(&node.name);
    out.push('\n');

    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == child_count - 1;
        let connector = if is_last_child {
            "└── "
        } else {
            "├── "
        };
        let child_prefix = if is_last_child { "    " } else { "│   " };

        out.push_str(prefix);
        out.push_str(connector);
        format_tree_node(child, &format!("{}{}", prefix, child_prefix), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn names(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    fn trashed(mut doc: Document, path: &str) -> Document {
        doc.content_file_path = path.to_string();
        doc
    }

    #[test]
    fn test_empty_project_has_every_bucket_and_trash() {
        let tree = build_tree_from("Novel", &[]);
        assert_eq!(tree.kind, NodeKind::Root);
        assert_eq!(
            names(&tree),
            vec![
                "Manuscript", "Characters", "Locations", "Research", "Notes", "Timelines",
                "Plots", "Objects", "Entities", "Other", "Trashcan"
            ]
        );
        assert!(tree.trash().is_some());
        for t in DocumentType::BUCKETS {
            assert!(tree.bucket(t).is_some(), "missing bucket for {}", t);
        }
    }

    #[test]
    fn test_chapters_nest_scenes_in_order() {
        let ch = Document::new("Chapter 1", DocumentType::Chapter);
        let mut s1 = Document::new("Second", DocumentType::Scene).with_parent(ch.id);
        s1.order = 2;
        let mut s2 = Document::new("First", DocumentType::Scene).with_parent(ch.id);
        s2.order = 1;
        let docs = vec![ch.clone(), s1, s2];

        let tree = build_tree_from("Novel", &docs);
        let chapter = tree.find_document(ch.id).unwrap();
        assert_eq!(names(chapter), vec!["First", "Second"]);
    }

    #[test]
    fn test_root_chapters_sorted_by_creation() {
        let mut late = Document::new("Late", DocumentType::Chapter);
        let early = Document::new("Early", DocumentType::Chapter);
        late.created = early.created + Duration::seconds(10);
        late.order = -5;

        let tree = build_tree_from("Novel", &[late, early]);
        let manuscript = tree.bucket(DocumentType::Chapter).unwrap();
        assert_eq!(names(manuscript), vec!["Early", "Late"]);
    }

    #[test]
    fn test_folders_group_by_segment() {
        let docs = vec![
            Document::new("Ch A", DocumentType::Chapter).with_folder("Part 2"),
            Document::new("Ch B", DocumentType::Chapter).with_folder("Part 1"),
            Document::new("Ch C", DocumentType::Chapter).with_folder("Part 1/Act 1"),
            Document::new("Ch D", DocumentType::Chapter),
        ];
        let tree = build_tree_from("Novel", &docs);
        let manuscript = tree.bucket(DocumentType::Chapter).unwrap();
        assert_eq!(names(manuscript), vec!["Part 1", "Part 2", "Ch D"]);

        let part1 = &manuscript.children[0];
        assert!(part1.is_folder());
        assert_eq!(part1.folder_path.as_deref(), Some("Part 1"));
        assert_eq!(part1.folder_type, Some(DocumentType::Chapter));
        assert_eq!(names(part1), vec!["Act 1", "Ch B"]);
        assert_eq!(part1.children[0].folder_path.as_deref(), Some("Part 1/Act 1"));
    }

    #[test]
    fn test_buckets_sort_by_order_then_title() {
        let mut zed = Document::new("zed", DocumentType::Character);
        zed.order = 0;
        let mut amy = Document::new("Amy", DocumentType::Character);
        amy.order = 0;
        let mut bob = Document::new("Bob", DocumentType::Character);
        bob.order = -1;

        let tree = build_tree_from("Novel", &[zed, amy, bob]);
        let characters = tree.bucket(DocumentType::Character).unwrap();
        assert_eq!(names(characters), vec!["Bob", "Amy", "zed"]);
    }

    #[test]
    fn test_trash_rebuilds_folders_from_paths() {
        let ch = trashed(
            Document::new("Chapter 1", DocumentType::Chapter),
            "Trashcan/Manuscript/Chapter-1/content.md",
        );
        let scene = trashed(
            Document::new("Scene 1", DocumentType::Scene).with_parent(ch.id),
            "Trashcan/Manuscript/Chapter-1/Scene-1.md",
        );
        let note = trashed(Document::new("Zeta", DocumentType::Note), "trashcan/notes/Zeta.md");
        let loose = trashed(Document::new("Loose", DocumentType::Other), "Trashcan/Loose.md");

        let tree = build_tree_from("Novel", &[ch, scene, note, loose]);
        let trash = tree.trash().unwrap();

        assert_eq!(names(trash), vec!["Manuscript", "notes", "Loose"]);
        let manuscript = &trash.children[0];
        assert_eq!(manuscript.folder_type, Some(DocumentType::Chapter));
        assert_eq!(names(manuscript), vec!["Chapter-1"]);

        let chapter_dir = &manuscript.children[0];
        assert_eq!(
            chapter_dir.folder_path.as_deref(),
            Some("Trashcan/Manuscript/Chapter-1")
        );
        assert_eq!(names(chapter_dir), vec!["Chapter 1", "Scene 1"]);

        // Trashed documents stay out of their buckets
        assert!(tree.bucket(DocumentType::Chapter).unwrap().children.is_empty());
    }

    #[test]
    fn test_every_document_appears_exactly_once() {
        let ch = Document::new("Chapter", DocumentType::Chapter).with_folder("Part");
        let scene = Document::new("Scene", DocumentType::Scene).with_parent(ch.id);
        let orphan = Document::new("Orphan", DocumentType::Scene).with_parent(DocumentId::new());
        let gone_chapter = trashed(
            Document::new("Gone", DocumentType::Chapter),
            "Trashcan/Manuscript/Gone/content.md",
        );
        // Active scene whose chapter is trashed
        let stray = Document::new("Stray", DocumentType::Scene).with_parent(gone_chapter.id);
        let mut docs = vec![ch, scene, orphan, gone_chapter, stray];
        for t in DocumentType::BUCKETS {
            docs.push(Document::new(format!("{} doc", t), t).with_folder("Sub"));
        }

        let tree = build_tree_from("Novel", &docs);
        let mut seen = tree.document_ids();
        let mut expected: Vec<DocumentId> = docs.iter().map(|d| d.id).collect();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_format_tree() {
        let docs = vec![Document::new("Mira", DocumentType::Character)];
        let rendered = format_tree(&build_tree_from("Novel", &docs));
        assert!(rendered.starts_with(
            "🗂 Novel\n├── 📚 Manuscript\n├── 👤 Characters\n│   └── 👤 Mira\n"
        ));
        assert!(rendered.ends_with("└── 🗑 Trashcan\n"));
    }
}
