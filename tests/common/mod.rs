#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use openai_assistant::{
    Assistant, AssistantClient, AssistantCreateRequest, AssistantDeleteResponse, AssistantError,
    AssistantList, AssistantUpdateRequest, FileClient, FileDeleteResponse, FileObject,
    FileUploadRequest, Result,
};

/// In-memory stand-in for the remote Assistants and Files API that counts
/// the calls made against it.
#[derive(Debug, Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    assistants: BTreeMap<String, Assistant>,
    files: BTreeMap<String, FileObject>,
    uploads: usize,
    file_deletes: usize,
    modifies: usize,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found(kind: &str, id: &str) -> AssistantError {
    AssistantError::NotFound {
        body: format!("No {kind} found with id '{id}'."),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake api lock")
    }

    pub fn upload_count(&self) -> usize {
        self.state().uploads
    }

    pub fn file_delete_count(&self) -> usize {
        self.state().file_deletes
    }

    pub fn modify_count(&self) -> usize {
        self.state().modifies
    }

    pub fn file_exists(&self, file_id: &str) -> bool {
        self.state().files.contains_key(file_id)
    }

    pub fn remote_file_count(&self) -> usize {
        self.state().files.len()
    }

    pub fn assistant_count(&self) -> usize {
        self.state().assistants.len()
    }

    /// Deletes a file without going through the client, as another process would.
    pub fn remove_file_out_of_band(&self, file_id: &str) {
        self.state().files.remove(file_id);
    }
}

#[async_trait]
impl AssistantClient for FakeApi {
    async fn create_assistant(&self, request: AssistantCreateRequest) -> Result<Assistant> {
        let mut state = self.state();
        let n = state.next_id();
        let assistant = Assistant {
            id: format!("asst_{n:04}"),
            object: "assistant".to_string(),
            created_at: n,
            name: request.name,
            description: request.description,
            model: request.model,
            instructions: request.instructions,
            tools: request.tools,
            tool_resources: request.tool_resources,
            metadata: request.metadata,
        };
        state
            .assistants
            .insert(assistant.id.clone(), assistant.clone());
        Ok(assistant)
    }

    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        self.state()
            .assistants
            .get(assistant_id)
            .cloned()
            .ok_or_else(|| not_found("assistant", assistant_id))
    }

    async fn modify_assistant(
        &self,
        assistant_id: &str,
        request: AssistantUpdateRequest,
    ) -> Result<Assistant> {
        let mut state = self.state();
        state.modifies += 1;
        let assistant = state
            .assistants
            .get_mut(assistant_id)
            .ok_or_else(|| not_found("assistant", assistant_id))?;
        if let Some(model) = request.model {
            assistant.model = model;
        }
        if let Some(name) = request.name {
            assistant.name = Some(name);
        }
        if let Some(instructions) = request.instructions {
            assistant.instructions = Some(instructions);
        }
        if let Some(tools) = request.tools {
            assistant.tools = tools;
        }
        if let Some(tool_resources) = request.tool_resources {
            assistant.tool_resources = Some(tool_resources);
        }
        Ok(assistant.clone())
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<AssistantDeleteResponse> {
        self.state()
            .assistants
            .remove(assistant_id)
            .map(|assistant| AssistantDeleteResponse {
                id: assistant.id,
                deleted: true,
            })
            .ok_or_else(|| not_found("assistant", assistant_id))
    }

    async fn list_assistants(
        &self,
        limit: Option<u32>,
        after: Option<String>,
    ) -> Result<AssistantList> {
        let state = self.state();
        let limit = limit.unwrap_or(20) as usize;
        let remaining: Vec<Assistant> = state
            .assistants
            .values()
            .filter(|assistant| after.as_deref().is_none_or(|after| assistant.id.as_str() > after))
            .cloned()
            .collect();
        let has_more = remaining.len() > limit;
        let data: Vec<Assistant> = remaining.into_iter().take(limit).collect();
        Ok(AssistantList {
            first_id: data.first().map(|assistant| assistant.id.clone()),
            last_id: data.last().map(|assistant| assistant.id.clone()),
            has_more,
            data,
        })
    }
}

#[async_trait]
impl FileClient for FakeApi {
    async fn upload_file(&self, request: FileUploadRequest) -> Result<String> {
        let mut state = self.state();
        let n = state.next_id();
        state.uploads += 1;
        let file = FileObject {
            id: format!("file-{n:04}"),
            bytes: request.bytes.len() as u64,
            created_at: n,
            filename: request.filename,
            purpose: request.purpose,
            status: Some("processed".to_string()),
        };
        let id = file.id.clone();
        state.files.insert(id.clone(), file);
        Ok(id)
    }

    async fn list_files(&self) -> Result<Vec<FileObject>> {
        Ok(self.state().files.values().cloned().collect())
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        self.state()
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| not_found("file", file_id))
    }

    async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse> {
        let mut state = self.state();
        state.file_deletes += 1;
        state
            .files
            .remove(file_id)
            .map(|file| FileDeleteResponse {
                id: file.id,
                deleted: true,
            })
            .ok_or_else(|| not_found("file", file_id))
    }
}
