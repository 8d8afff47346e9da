use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_FILE_PURPOSE: &str = "assistants";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDeleteResponse {
    pub id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub purpose: String,
    pub media_type: Option<String>,
}

impl FileUploadRequest {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            purpose: DEFAULT_FILE_PURPOSE.to_string(),
            media_type: None,
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }
}

#[async_trait]
pub trait FileClient: Send + Sync {
    /// Uploads the bytes and returns the new remote file id.
    async fn upload_file(&self, request: FileUploadRequest) -> Result<String>;

    async fn list_files(&self) -> Result<Vec<FileObject>>;

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject>;

    async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse>;
}
