use tracing::{debug, info};

use crate::assistant::{
    Assistant, AssistantClient, AssistantCreateRequest, AssistantUpdateRequest, ToolResources,
};
use crate::profile::{AssistantSettings, Config, Env};
use crate::providers::OpenAI;
use crate::{AssistantError, Result};

const LIST_PAGE_SIZE: u32 = 100;

/// Owns at most one live remote assistant and the client used to reach it.
#[derive(Debug, Clone)]
pub struct AssistantManager<C> {
    client: C,
    settings: AssistantSettings,
    assistant_id: Option<String>,
}

impl AssistantManager<OpenAI> {
    pub async fn from_config(config: &Config, env: &Env) -> Result<Self> {
        let client = OpenAI::from_config(&config.provider, env).await?;
        Ok(Self::new(client).with_settings(config.assistant.clone()))
    }
}

impl<C: AssistantClient> AssistantManager<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            settings: AssistantSettings::default(),
            assistant_id: None,
        }
    }

    pub fn with_settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adopts an assistant created elsewhere as the live one.
    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    pub async fn create(&mut self, name: &str) -> Result<Assistant> {
        let request = AssistantCreateRequest {
            model: self.settings.model.clone(),
            name: Some(name.to_string()),
            description: self.settings.description.clone(),
            instructions: self.settings.instructions.clone(),
            tools: self.settings.tools.clone(),
            ..Default::default()
        };
        let assistant = self.client.create_assistant(request).await?;
        info!(assistant_id = %assistant.id, assistant_name = name, "created assistant");
        self.assistant_id = Some(assistant.id.clone());
        Ok(assistant)
    }

    pub async fn retrieve(&self) -> Result<Assistant> {
        let assistant_id = self.assistant_id().ok_or(AssistantError::NoAssistant)?;
        self.client.retrieve_assistant(assistant_id).await
    }

    pub async fn retrieve_by_id(&self, assistant_id: &str) -> Result<Assistant> {
        self.client.retrieve_assistant(assistant_id).await
    }

    /// Every assistant visible to the account, following pagination.
    pub async fn list(&self) -> Result<Vec<Assistant>> {
        let mut out = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page = self
                .client
                .list_assistants(Some(LIST_PAGE_SIZE), after.take())
                .await?;
            let next = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|assistant| assistant.id.clone()))
                .filter(|id| !id.is_empty());
            let has_more = page.has_more && !page.data.is_empty();
            out.extend(page.data);
            match next {
                Some(next) if has_more => after = Some(next),
                _ => break,
            }
        }
        debug!(count = out.len(), "listed assistants");
        Ok(out)
    }

    /// First assistant whose name matches exactly, by linear scan.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Assistant>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|assistant| assistant.name.as_deref() == Some(name)))
    }

    pub async fn delete_by_id(&mut self, assistant_id: &str) -> Result<bool> {
        let response = self.client.delete_assistant(assistant_id).await?;
        info!(assistant_id, deleted = response.deleted, "deleted assistant");
        if self.assistant_id.as_deref() == Some(assistant_id) {
            self.assistant_id = None;
        }
        Ok(response.deleted)
    }

    /// Deletes every assistant named `name`; returns how many were deleted.
    pub async fn delete_by_name(&mut self, name: &str) -> Result<usize> {
        let matching: Vec<String> = self
            .list()
            .await?
            .into_iter()
            .filter(|assistant| assistant.name.as_deref() == Some(name))
            .map(|assistant| assistant.id)
            .collect();
        self.delete_each(matching).await
    }

    pub async fn delete_all_assistants(&mut self) -> Result<usize> {
        let ids: Vec<String> = self
            .list()
            .await?
            .into_iter()
            .map(|assistant| assistant.id)
            .collect();
        self.delete_each(ids).await
    }

    async fn delete_each(&mut self, ids: Vec<String>) -> Result<usize> {
        let mut deleted = 0;
        for id in ids {
            if self.delete_by_id(&id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

/// Rewrites the assistant's code interpreter file list, adding `attach` and
/// dropping `detach`. Skips the remote update when nothing changes and
/// returns the resulting list.
pub(crate) async fn update_attached_files<C>(
    client: &C,
    assistant_id: &str,
    attach: &[String],
    detach: &[String],
) -> Result<Vec<String>>
where
    C: AssistantClient + ?Sized,
{
    let assistant = client.retrieve_assistant(assistant_id).await?;
    let current = assistant.file_ids().to_vec();

    let mut next: Vec<String> = current
        .iter()
        .filter(|id| !detach.contains(*id))
        .cloned()
        .collect();
    for id in attach {
        if !next.contains(id) {
            next.push(id.clone());
        }
    }
    if next == current {
        return Ok(next);
    }

    let mut tool_resources = ToolResources::with_code_interpreter_files(next);
    tool_resources.file_search = assistant
        .tool_resources
        .and_then(|resources| resources.file_search);
    let request = AssistantUpdateRequest {
        tool_resources: Some(tool_resources),
        ..Default::default()
    };
    let updated = client.modify_assistant(assistant_id, request).await?;
    debug!(assistant_id, files = updated.file_ids().len(), "updated attached files");
    Ok(updated.file_ids().to_vec())
}
