use assert_fs::prelude::*;

use vidbook::document::{Chapter, Document, Image};
use vidbook::error::VidbookError;
use vidbook::library::Library;

fn document(title: &str) -> Document {
    Document {
        title: title.to_string(),
        introduction: "Introduction".to_string(),
        chapters: vec![Chapter {
            title: "One".to_string(),
            content: "Body".to_string(),
            images: vec![Image { url: "data:image/jpeg;base64,AA==".to_string(), caption: "Slide".to_string() }],
        }],
    }
}

#[tokio::test]
async fn test_new_documents_are_listed_first() {
    let dir = assert_fs::TempDir::new().unwrap();
    let library = Library::new(dir.child("library.json").path());

    let first = library.add(document("First")).await.unwrap();
    let second = library.add(document("Second")).await.unwrap();

    let listed = library.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
    assert_ne!(first.id, second.id);
    assert_eq!(first.created_at, first.updated_at);
}

#[tokio::test]
async fn test_update_replaces_document_and_bumps_timestamp() {
    let dir = assert_fs::TempDir::new().unwrap();
    let library = Library::new(dir.child("library.json").path());

    let stored = library.add(document("Draft")).await.unwrap();
    let updated = library.update(&stored.id, document("Final")).await.unwrap();

    assert_eq!(updated.id, stored.id);
    assert_eq!(updated.created_at, stored.created_at);
    assert!(updated.updated_at >= updated.created_at);

    let fetched = library.get(&stored.id).await.unwrap().unwrap();
    assert_eq!(fetched.document.title, "Final");
}

#[tokio::test]
async fn test_update_unknown_id_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let library = Library::new(dir.child("library.json").path());

    let err = library.update("missing", document("X")).await.unwrap_err();
    assert!(matches!(err, VidbookError::Library(_)));
}

#[tokio::test]
async fn test_delete_removes_only_matching_entry() {
    let dir = assert_fs::TempDir::new().unwrap();
    let library = Library::new(dir.child("library.json").path());

    let keep = library.add(document("Keep")).await.unwrap();
    let removed = library.add(document("Drop")).await.unwrap();

    assert!(library.delete(&removed.id).await.unwrap());
    assert!(!library.delete(&removed.id).await.unwrap());

    let listed = library.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, keep.id);
}

#[tokio::test]
async fn test_library_file_is_a_json_array_of_flat_entries() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("data").child("library.json");
    let library = Library::new(file.path());

    library.add(document("Stored")).await.unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    assert!(content.contains("\"createdAt\""));
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["title"], "Stored");
    assert_eq!(value[0]["chapters"][0]["images"][0]["caption"], "Slide");
}

#[tokio::test]
async fn test_exported_markdown_includes_images() {
    let dir = assert_fs::TempDir::new().unwrap();
    let library = Library::new(dir.child("library.json").path());
    let stored = library.add(document("Export")).await.unwrap();

    let markdown = stored.document.to_markdown();
    assert!(markdown.starts_with("# Export\n\n## Introduction\nIntroduction\n"));
    assert!(markdown.contains("## Chapter 1: One\nBody\n"));
    assert!(markdown.contains("![Slide](data:image/jpeg;base64,AA==)\n*Slide*"));
}
