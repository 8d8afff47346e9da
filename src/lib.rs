//! Convenience layer over the OpenAI Assistants API: manage one live
//! assistant and keep its attached files in sync with local content without
//! re-uploading unchanged bytes.

pub mod assistant;
mod assistant_manager;
mod error;
pub mod file;
pub mod file_cache;
mod profile;
pub mod providers;
pub mod utils;

pub use assistant::{
    Assistant, AssistantClient, AssistantCreateRequest, AssistantDeleteResponse, AssistantList,
    AssistantTool, AssistantUpdateRequest, ToolResources,
};
pub use assistant_manager::AssistantManager;
pub use error::{AssistantError, Result};
pub use file::{FileClient, FileDeleteResponse, FileObject, FileUploadRequest};
#[cfg(feature = "store-sqlite")]
pub use file_cache::SqliteFileCacheStore;
pub use file_cache::{
    CacheEntry, FileCacheStore, FileManager, MemoryFileCacheStore, calculate_file_hash,
    content_hash, has_file_changed,
};
pub use profile::{
    AssistantSettings, Config, Env, FilesConfig, OPENAI_API_KEY, ProviderAuth, ProviderConfig,
    parse_dotenv,
};
pub use providers::OpenAI;
