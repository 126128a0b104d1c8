//! End-to-end scenarios against the real filesystem

use std::fs;
use std::path::Path;

use quire_core::document::{DocumentId, DocumentType};
use quire_core::fs::RealFileSystem;
use quire_core::project::Project;
use quire_core::store::ProjectStore;
use quire_core::sync::{self, FileOutcome, RestoreTarget};
use quire_core::tree::{NodeKind, build_tree};

/// "Chapter 1" with "Scene 1", saved into `dir`
fn saved_project(dir: &Path) -> (ProjectStore<RealFileSystem>, Project, DocumentId, DocumentId) {
    let store = ProjectStore::new(RealFileSystem);
    let mut project = Project::new("Novel");
    let chapter = project
        .add_document("Chapter 1", DocumentType::Chapter, None, "")
        .unwrap();
    let scene = project
        .add_document("Scene 1", DocumentType::Scene, Some(chapter), "")
        .unwrap();
    project
        .document_mut(chapter)
        .unwrap()
        .set_content("# Chapter 1\n");
    project
        .document_mut(scene)
        .unwrap()
        .set_content("The harbor was quiet.\n");

    store.save(&mut project, &dir.join("Novel.quire")).unwrap();
    (store, project, chapter, scene)
}

#[test]
fn save_then_load_preserves_documents_and_content() {
    let temp = tempfile::tempdir().unwrap();
    let store = ProjectStore::new(RealFileSystem);
    let mut project = store.create(temp.path(), "Novel", true, None).unwrap();
    let index = project.path.clone();

    let mut loaded = store.load(&index).unwrap();
    assert_eq!(loaded.documents.len(), project.documents.len());

    let dir = loaded.directory().to_path_buf();
    for original in project.documents.iter_mut() {
        let doc = loaded.document_mut(original.id).unwrap();
        assert_eq!(doc.title, original.title);
        assert_eq!(doc.doc_type, original.doc_type);
        assert_eq!(
            doc.get_content(&RealFileSystem, &dir),
            original.get_content(&RealFileSystem, &dir)
        );
    }
}

#[test]
fn renamed_scene_moves_on_save() {
    let temp = tempfile::tempdir().unwrap();
    let (store, mut project, _, scene) = saved_project(temp.path());
    let old = temp.path().join("Manuscript/Chapter-1/Scene-1.md");
    assert!(old.exists());

    project.rename_document(scene, "Scene One!").unwrap();
    let report = store.save(&mut project, &temp.path().join("Novel.quire")).unwrap();

    let new = temp.path().join("Manuscript/Chapter-1/Scene-One.md");
    assert!(!old.exists());
    assert_eq!(fs::read_to_string(new).unwrap(), "The harbor was quiet.\n");
    assert_eq!(
        project.document(scene).unwrap().content_file_path,
        "Manuscript/Chapter-1/Scene-One.md"
    );
    assert_eq!(report.moved().count(), 1);
}

#[test]
fn trashing_a_chapter_moves_its_scenes_and_shows_in_tree() {
    let temp = tempfile::tempdir().unwrap();
    let (_, mut project, chapter, scene) = saved_project(temp.path());

    let report = sync::move_to_trash(&RealFileSystem, &mut project, chapter).unwrap();
    assert!(report.relocations.iter().all(|r| r.outcome == FileOutcome::Moved));
    assert!(temp.path().join("Trashcan/Manuscript/Chapter-1/content.md").exists());
    assert!(temp.path().join("Trashcan/Manuscript/Chapter-1/Scene-1.md").exists());
    assert!(!temp.path().join("Manuscript/Chapter-1").exists());

    let tree = build_tree(&project);
    let trash = tree.trash().unwrap();
    let manuscript = &trash.children[0];
    assert_eq!(manuscript.name, "Manuscript");
    assert_eq!(manuscript.kind, NodeKind::Folder);
    let chapter_dir = &manuscript.children[0];
    assert_eq!(chapter_dir.name, "Chapter-1");

    let mut ids = chapter_dir.document_ids();
    ids.sort();
    let mut expected = vec![chapter, scene];
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn restore_returns_files_to_their_original_paths() {
    let temp = tempfile::tempdir().unwrap();
    let (store, mut project, chapter, scene) = saved_project(temp.path());
    let before: Vec<String> = [chapter, scene]
        .iter()
        .map(|id| project.document(*id).unwrap().content_file_path.clone())
        .collect();

    sync::move_to_trash(&RealFileSystem, &mut project, chapter).unwrap();
    let target = RestoreTarget::bucket(DocumentType::Chapter);
    sync::restore_from_trash(&RealFileSystem, &mut project, chapter, &target).unwrap();

    let after: Vec<String> = [chapter, scene]
        .iter()
        .map(|id| project.document(*id).unwrap().content_file_path.clone())
        .collect();
    assert_eq!(before, after);
    assert_eq!(project.document(scene).unwrap().parent_id, Some(chapter));
    assert_eq!(
        fs::read_to_string(temp.path().join("Manuscript/Chapter-1/Scene-1.md")).unwrap(),
        "The harbor was quiet.\n"
    );
    assert!(!temp.path().join("Trashcan/Manuscript").exists());

    // Nothing left to heal
    let report = store.save(&mut project, &temp.path().join("Novel.quire")).unwrap();
    assert!(report.relocations.is_empty());
}

#[test]
fn empty_trash_deletes_files_for_good() {
    let temp = tempfile::tempdir().unwrap();
    let (store, mut project, chapter, _) = saved_project(temp.path());

    sync::move_to_trash(&RealFileSystem, &mut project, chapter).unwrap();
    let report = sync::empty_trash(&RealFileSystem, &mut project);
    assert_eq!(report.deleted.len(), 2);
    assert!(project.documents.is_empty());
    assert!(!temp.path().join("Trashcan").exists());

    store.save(&mut project, &temp.path().join("Novel.quire")).unwrap();
    let loaded = store.load(&temp.path().join("Novel.quire")).unwrap();
    assert!(loaded.documents.is_empty());
}

#[test]
fn folder_rename_is_applied_on_save() {
    let temp = tempfile::tempdir().unwrap();
    let (store, mut project, chapter, scene) = saved_project(temp.path());
    let index = temp.path().join("Novel.quire");

    project.move_document(chapter, None, "Part 1").unwrap();
    store.save(&mut project, &index).unwrap();
    assert!(temp.path().join("Manuscript/Part-1/Chapter-1/Scene-1.md").exists());

    sync::rename_folder(&mut project, DocumentType::Chapter, "Part 1", "Book One").unwrap();
    store.save(&mut project, &index).unwrap();

    assert_eq!(
        project.document(scene).unwrap().content_file_path,
        "Manuscript/Book-One/Chapter-1/Scene-1.md"
    );
    assert!(temp.path().join("Manuscript/Book-One/Chapter-1/content.md").exists());
    assert!(!temp.path().join("Manuscript/Part-1").exists());
}
