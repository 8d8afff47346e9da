use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::hash::content_hash;
use super::store::{CacheEntry, FileCacheStore};
use crate::assistant::AssistantClient;
use crate::assistant_manager::{AssistantManager, update_attached_files};
use crate::file::{DEFAULT_FILE_PURPOSE, FileClient, FileDeleteResponse, FileUploadRequest};
use crate::{AssistantError, Result};

/// Uploads files for one assistant, skipping uploads whose content is
/// already on the remote side under the same key.
///
/// The store is owned by the manager; callers that want it back (to clear
/// or inspect it) use [`FileManager::store`] or [`FileManager::into_store`].
#[derive(Debug)]
pub struct FileManager<C, S> {
    client: C,
    store: S,
    assistant_id: String,
    purpose: String,
}

impl<C, S> FileManager<C, S>
where
    C: AssistantClient + FileClient,
    S: FileCacheStore,
{
    pub fn new(client: C, store: S, assistant_id: impl Into<String>) -> Self {
        Self {
            client,
            store,
            assistant_id: assistant_id.into(),
            purpose: DEFAULT_FILE_PURPOSE.to_string(),
        }
    }

    /// Binds to the manager's live assistant.
    pub fn for_assistant(manager: &AssistantManager<C>, store: S) -> Result<Self>
    where
        C: Clone,
    {
        let assistant_id = manager
            .assistant_id()
            .ok_or(AssistantError::NoAssistant)?;
        Ok(Self::new(manager.client().clone(), store, assistant_id))
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub async fn cached_entry(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.store.get(key).await
    }

    /// Returns the remote id holding `path`'s current content under `key`,
    /// uploading and attaching it only when the content changed.
    ///
    /// A superseded upload is detached and deleted remotely once the store
    /// points at its replacement; one already gone remotely is skipped. If
    /// attaching the new upload fails, the upload is deleted again before the
    /// error is returned.
    pub async fn upload_file(&self, path: impl AsRef<Path>, key: &str) -> Result<String> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let digest = content_hash(&bytes);

        let previous = self.store.get(key).await?;
        if let Some(entry) = previous.as_ref() {
            if entry.content_hash == digest {
                debug!(key, file_id = %entry.remote_file_id, "file unchanged, skipping upload");
                return Ok(entry.remote_file_id.clone());
            }
        }

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());
        let request = FileUploadRequest::new(filename, bytes).with_purpose(self.purpose.clone());
        let file_id = self.client.upload_file(request).await?;
        info!(key, file_id = %file_id, "uploaded file");

        let superseded: Vec<String> = previous
            .iter()
            .map(|entry| entry.remote_file_id.clone())
            .filter(|old| old != &file_id)
            .collect();
        if let Err(err) = update_attached_files(
            &self.client,
            &self.assistant_id,
            std::slice::from_ref(&file_id),
            &superseded,
        )
        .await
        {
            self.discard_upload(&file_id).await;
            return Err(err);
        }

        self.store
            .put(CacheEntry::new(key, digest, file_id.clone()))
            .await?;

        for old in &superseded {
            match self.client.delete_file(old).await {
                Ok(_) => debug!(key, file_id = %old, "deleted superseded upload"),
                Err(err) if err.is_not_found() => {
                    warn!(key, file_id = %old, "superseded upload already gone remotely");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(file_id)
    }

    async fn discard_upload(&self, file_id: &str) {
        if let Err(err) = self.client.delete_file(file_id).await {
            warn!(file_id, error = %err, "failed to delete unattached upload");
        }
    }

    /// Ids attached to the assistant right now, as reported by the remote
    /// service rather than the local store.
    pub async fn get_uploaded_file_ids(&self) -> Result<BTreeSet<String>> {
        let assistant = self.client.retrieve_assistant(&self.assistant_id).await?;
        Ok(assistant.file_ids().iter().cloned().collect())
    }

    /// Detaches and deletes `file_id` and drops every cache entry pointing at
    /// it. A file already gone remotely still has its entries dropped, and
    /// the `NotFound` error is returned.
    pub async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse> {
        update_attached_files(
            &self.client,
            &self.assistant_id,
            &[],
            &[file_id.to_string()],
        )
        .await?;
        let response = match self.client.delete_file(file_id).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                let removed = self.store.remove_by_file_id(file_id).await?;
                warn!(
                    file_id,
                    cache_entries = removed.len(),
                    "file already gone remotely, dropped cached entries"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let removed = self.store.remove_by_file_id(file_id).await?;
        info!(
            file_id,
            deleted = response.deleted,
            cache_entries = removed.len(),
            "deleted file"
        );
        Ok(response)
    }

    /// Detaches and deletes every attached or cached file, then clears the
    /// store. Returns `false` when any remote delete did not go through; a
    /// cached id that no longer exists remotely counts as such.
    pub async fn delete_all_files(&self) -> Result<bool> {
        let attached = self.get_uploaded_file_ids().await?;
        let mut file_ids = attached.clone();
        file_ids.extend(
            self.store
                .entries()
                .await?
                .into_iter()
                .map(|entry| entry.remote_file_id),
        );

        if !attached.is_empty() {
            let detach: Vec<String> = attached.iter().cloned().collect();
            update_attached_files(&self.client, &self.assistant_id, &[], &detach).await?;
        }

        let mut all_deleted = true;
        for file_id in &file_ids {
            match self.client.delete_file(file_id).await {
                Ok(response) => all_deleted &= response.deleted,
                Err(err) if err.is_not_found() => {
                    warn!(file_id = %file_id, "cached file already gone remotely");
                    all_deleted = false;
                }
                Err(err) => return Err(err),
            }
        }

        self.store.clear().await?;
        info!(count = file_ids.len(), all_deleted, "deleted all files");
        Ok(all_deleted)
    }
}
