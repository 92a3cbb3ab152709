use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::Document;
use crate::error::{Result, VidbookError};

/// A saved document with its identifier and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: Document,
}

/// Saved documents kept as one JSON array, newest first. Every mutation
/// reads and rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
}

impl Library {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved documents, newest first. A missing file is an empty library.
    pub async fn list(&self) -> Result<Vec<StoredDocument>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            VidbookError::Library(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        Ok(self.list().await?.into_iter().find(|d| d.id == id))
    }

    /// Store a new document in front of the existing ones
    pub async fn add(&self, document: Document) -> Result<StoredDocument> {
        let mut entries = self.list().await?;

        let now = Utc::now();
        let stored = StoredDocument {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            document,
        };

        entries.insert(0, stored.clone());
        self.write(&entries).await?;

        info!("Saved document \"{}\" as {}", stored.document.title, stored.id);
        Ok(stored)
    }

    /// Replace the content of an existing document, keeping its position
    pub async fn update(&self, id: &str, document: Document) -> Result<StoredDocument> {
        let mut entries = self.list().await?;

        let entry = entries
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| VidbookError::Library(format!("No document with id {}", id)))?;

        entry.document = document;
        entry.updated_at = Utc::now().max(entry.created_at);
        let updated = entry.clone();

        self.write(&entries).await?;
        Ok(updated)
    }

    /// Remove a document. Returns false when the id is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.list().await?;
        let before = entries.len();
        entries.retain(|d| d.id != id);

        if entries.len() == before {
            return Ok(false);
        }

        self.write(&entries).await?;
        info!("Deleted document {}", id);
        Ok(true)
    }

    async fn write(&self, entries: &[StoredDocument]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        debug!("Wrote {} documents to {}", entries.len(), self.path.display());
        Ok(())
    }
}
