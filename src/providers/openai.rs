use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::assistant::{
    Assistant, AssistantClient, AssistantCreateRequest, AssistantDeleteResponse, AssistantList,
    AssistantUpdateRequest,
};
use crate::file::{FileClient, FileDeleteResponse, FileObject, FileUploadRequest};
use crate::profile::{AuthHeader, Env, ProviderConfig};
use crate::{AssistantError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);
const ASSISTANTS_BETA: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Client for the OpenAI Assistants (v2) and Files endpoints.
#[derive(Clone)]
pub struct OpenAI {
    http: reqwest::Client,
    base_url: String,
    auth: Option<AuthHeader>,
    query: Vec<(String, String)>,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(AuthHeader::name))
            .finish()
    }
}

impl OpenAI {
    /// Bearer-authenticated client against the public API. A blank key sends
    /// no auth header.
    pub fn new(api_key: impl AsRef<str>) -> Self {
        let api_key = api_key.as_ref().trim();
        Self {
            http: http_client(HeaderMap::new()).unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: (!api_key.is_empty())
                .then(|| AuthHeader::bearer(api_key).ok())
                .flatten(),
            query: Vec::new(),
        }
    }

    pub async fn from_config(config: &ProviderConfig, env: &Env) -> Result<Self> {
        let auth = config
            .auth
            .clone()
            .unwrap_or_default()
            .resolve_header(env)
            .await?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.http_headers {
            insert_header(&mut headers, name, value)?;
        }
        if let Some(organization) = non_blank(config.organization.as_deref()) {
            insert_header(&mut headers, "OpenAI-Organization", organization)?;
        }
        if let Some(project) = non_blank(config.project.as_deref()) {
            insert_header(&mut headers, "OpenAI-Project", project)?;
        }

        Ok(Self {
            http: http_client(headers)?,
            base_url: non_blank(config.base_url.as_deref())
                .unwrap_or(DEFAULT_BASE_URL)
                .to_string(),
            auth: Some(auth),
            query: config
                .http_query_params
                .iter()
                .filter(|(name, _)| !name.trim().is_empty())
                .map(|(name, value)| (name.trim().to_string(), value.clone()))
                .collect(),
        })
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(path));
        if let Some(auth) = &self.auth {
            req = auth.apply(req);
        }
        if !self.query.is_empty() {
            req = req.query(&self.query);
        }
        req
    }

    fn assistants(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let (name, value) = ASSISTANTS_BETA;
        self.request(method, path).header(name, value)
    }
}

fn http_client(headers: HeaderMap) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .default_headers(headers)
        .build()?)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| AssistantError::Config(format!("invalid http header {name:?}: {err}")))?;
    let value = HeaderValue::from_str(value).map_err(|err| {
        AssistantError::Config(format!("invalid value for http header {name:?}: {err}"))
    })?;
    headers.insert(header, value);
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Sends the request; a non-success status becomes an error carrying the body.
async fn send<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T> {
    let response = req.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AssistantError::from_status(status, body));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl AssistantClient for OpenAI {
    async fn create_assistant(&self, request: AssistantCreateRequest) -> Result<Assistant> {
        send(self.assistants(Method::POST, "assistants").json(&request)).await
    }

    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let path = format!("assistants/{}", assistant_id.trim());
        send(self.assistants(Method::GET, &path)).await
    }

    async fn modify_assistant(
        &self,
        assistant_id: &str,
        request: AssistantUpdateRequest,
    ) -> Result<Assistant> {
        let path = format!("assistants/{}", assistant_id.trim());
        send(self.assistants(Method::POST, &path).json(&request)).await
    }

    async fn delete_assistant(&self, assistant_id: &str) -> Result<AssistantDeleteResponse> {
        let path = format!("assistants/{}", assistant_id.trim());
        send(self.assistants(Method::DELETE, &path)).await
    }

    async fn list_assistants(
        &self,
        limit: Option<u32>,
        after: Option<String>,
    ) -> Result<AssistantList> {
        let mut req = self.assistants(Method::GET, "assistants");
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit.to_string())]);
        }
        if let Some(after) = non_blank(after.as_deref()) {
            req = req.query(&[("after", after)]);
        }
        send(req).await
    }
}

#[async_trait]
impl FileClient for OpenAI {
    async fn upload_file(&self, request: FileUploadRequest) -> Result<String> {
        #[derive(Deserialize)]
        struct Uploaded {
            id: String,
        }

        let mut file = Part::bytes(request.bytes).file_name(request.filename);
        if let Some(media_type) = request.media_type.as_deref() {
            file = file.mime_str(media_type).map_err(|err| {
                AssistantError::Config(format!("invalid media type {media_type:?}: {err}"))
            })?;
        }
        let form = Form::new().text("purpose", request.purpose).part("file", file);

        let uploaded: Uploaded = send(self.request(Method::POST, "files").multipart(form)).await?;
        Ok(uploaded.id)
    }

    async fn list_files(&self) -> Result<Vec<FileObject>> {
        #[derive(Deserialize)]
        struct Page {
            data: Vec<FileObject>,
        }

        let page: Page = send(self.request(Method::GET, "files")).await?;
        Ok(page.data)
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        let path = format!("files/{}", file_id.trim());
        send(self.request(Method::GET, &path)).await
    }

    async fn delete_file(&self, file_id: &str) -> Result<FileDeleteResponse> {
        let path = format!("files/{}", file_id.trim());
        send(self.request(Method::DELETE, &path)).await
    }
}
