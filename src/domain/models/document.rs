use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::current_timestamp;

/// An uploaded document, already decoded to plain text by the caller.
///
/// A document is the sole owner of its chunks; deleting it removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    user_id: String,
    filename: String,
    original_name: String,
    file_type: String,
    file_size: u64,
    content: String,
    created_at: i64,
    updated_at: i64,
}

impl Document {
    pub fn new(user_id: impl Into<String>, upload: NewDocument) -> Self {
        let now = current_timestamp();
        let file_size = upload
            .file_size
            .unwrap_or(upload.content.len() as u64);
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            filename: upload.filename.clone(),
            original_name: upload.filename,
            file_type: upload.file_type,
            file_size,
            content: upload.content,
            created_at: now,
            updated_at: now,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        user_id: String,
        filename: String,
        original_name: String,
        file_type: String,
        file_size: u64,
        content: String,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            filename,
            original_name,
            file_type,
            file_size,
            content,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({}, {} bytes)",
            self.original_name, self.file_type, self.file_size
        )
    }
}

/// Upload payload: parsed text plus the metadata the caller knows about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub file_type: String,
    pub content: String,
    /// Size of the original upload; defaults to the text length.
    pub file_size: Option<u64>,
}

impl NewDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_type: "text/plain".to_string(),
            content: content.into(),
            file_size: None,
        }
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = file_type.into();
        self
    }

    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }
}
