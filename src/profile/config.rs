use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assistant::AssistantTool;
use crate::file::DEFAULT_FILE_PURPOSE;
use crate::{AssistantError, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_STORE_PATH: &str = "assistant_files.sqlite";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_tools() -> Vec<AssistantTool> {
    vec![AssistantTool::CodeInterpreter]
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_purpose() -> String {
    DEFAULT_FILE_PURPOSE.to_string()
}

/// Where the api key comes from. Resolved once, when the client is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderAuth {
    /// First non-blank variable among `keys`, sent as a bearer token.
    #[serde(rename = "api_key_env")]
    ApiKeyEnv {
        #[serde(default)]
        keys: Vec<String>,
    },
    /// Runs `command` and reads the key from its stdout.
    Command { command: Vec<String> },
    /// Key from the environment, sent as `header: <prefix><key>` instead of bearer auth.
    HttpHeaderEnv {
        header: String,
        #[serde(default)]
        keys: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
}

impl Default for ProviderAuth {
    fn default() -> Self {
        Self::ApiKeyEnv { keys: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth: Option<ProviderAuth>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub http_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub http_query_params: BTreeMap<String, String>,
}

/// Parameters used when the assistant manager creates a new assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default = "default_tools")]
    pub tools: Vec<AssistantTool>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            description: None,
            instructions: None,
            tools: default_tools(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_purpose")]
    pub purpose: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            purpose: default_purpose(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub files: FilesConfig,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        if self.assistant.model.trim().is_empty() {
            return Err(AssistantError::Config(
                "assistant.model must be non-empty".to_string(),
            ));
        }
        if self.files.purpose.trim().is_empty() {
            return Err(AssistantError::Config(
                "files.purpose must be non-empty".to_string(),
            ));
        }
        if self.files.store_path.as_os_str().is_empty() {
            return Err(AssistantError::Config(
                "files.store_path must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}
