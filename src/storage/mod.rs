//! Storage for uploaded employee photos and documents.
//!
//! Files are written under a root directory with a generated name and
//! published under a URL prefix. The published path (`/uploads/<name>`) is
//! what gets persisted on the employee row.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Attachment slot an upload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Document,
}

impl AttachmentKind {
    /// Map a multipart part name to its slot; `cv` is accepted for documents.
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "photo" => Some(AttachmentKind::Photo),
            "document" | "cv" => Some(AttachmentKind::Document),
            _ => None,
        }
    }
}

/// A file received with a submission, held in memory until validation passes
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub kind: AttachmentKind,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
    url_prefix: String,
}

impl UploadStore {
    /// Open the store, creating the root directory if needed
    pub fn open(root: impl Into<PathBuf>, url_prefix: &str) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::CreateDir {
            path: root.clone(),
            source,
        })?;

        Ok(Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Write the file under a fresh name and return its published path
    pub async fn save(&self, file: &UploadedFile) -> Result<String, StorageError> {
        let name = match file.file_name.as_deref().and_then(extension_of) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.root.join(&name);

        tokio::fs::write(&path, &file.data)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(
            path = %path.display(),
            size = file.data.len(),
            original_name = file.file_name.as_deref().unwrap_or(""),
            "Stored upload"
        );

        Ok(format!("{}/{}", self.url_prefix, name))
    }
}

/// Lowercased extension of a client-supplied file name, if it is safe to reuse
fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
