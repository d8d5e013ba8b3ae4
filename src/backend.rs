use crate::config::{normalize_base_url, Config};
use crate::error::BackendError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Raw body chunks of a streamed reply, in arrival order
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, BackendError>>;

/// Body of `POST /chat` and `POST /chat/stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub session_id: Option<String>,
    pub use_rag: bool,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, session_id: Option<String>, use_rag: bool) -> Self {
        Self {
            query: query.into(),
            session_id,
            use_rag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub context_used: Option<String>,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub services: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub status: String,
    pub device: Option<String>,
    pub model_path: Option<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub data_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub message: String,
    pub documents_processed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchModelResponse {
    pub status: String,
    pub message: String,
    pub model_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<serde_json::Value>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<serde_json::Value>,
    pub count: usize,
}

/// The chat surface the session manager talks to
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Address shown to the user when the backend cannot be reached
    fn base_url(&self) -> &str;

    /// Non-streaming chat
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;

    /// Streaming chat; resolves once response headers arrive with a success status
    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError>;
}

/// HTTP client for the CollegeGPT backend
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    base: Url,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let base_url = normalize_base_url(&config.backend_url);
        let base = Url::parse(&base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url));
        }

        // No overall timeout: a streamed reply may legitimately take minutes
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            base,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "backend returned error status");
        Err(BackendError::from_status(status, body))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "DELETE");
        let response = self.client.delete(url).send().await?;
        Self::decode(response).await
    }

    /// `GET /`
    pub async fn root(&self) -> Result<serde_json::Value, BackendError> {
        self.get_json(&[]).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        self.get_json(&["health"]).await
    }

    /// `GET /model-info`
    pub async fn model_info(&self) -> Result<ModelInfo, BackendError> {
        self.get_json(&["model-info"]).await
    }

    /// `POST /ingest`
    pub async fn ingest(&self, data_path: Option<&str>) -> Result<IngestResponse, BackendError> {
        let url = self.endpoint(&["ingest"])?;
        let body = IngestRequest {
            data_path: data_path.map(str::to_string),
        };
        tracing::info!(%url, data_path = ?body.data_path, "requesting document ingestion");
        let response = self.client.post(url).json(&body).send().await?;
        Self::decode(response).await
    }

    /// `DELETE /vector-store`
    pub async fn clear_vector_store(&self) -> Result<StatusMessage, BackendError> {
        self.delete_json(&["vector-store"]).await
    }

    /// `GET /sessions`
    pub async fn sessions(&self) -> Result<SessionList, BackendError> {
        self.get_json(&["sessions"]).await
    }

    /// `DELETE /session/{id}`
    pub async fn clear_session(&self, session_id: &str) -> Result<StatusMessage, BackendError> {
        self.delete_json(&["session", session_id]).await
    }

    /// `GET /search?query=&k=`
    pub async fn search(&self, query: &str, k: usize) -> Result<SearchResults, BackendError> {
        let url = self.endpoint(&["search"])?;
        tracing::debug!(%url, query, k, "GET");
        let response = self
            .client
            .get(url)
            .query(&[("query", query.to_string()), ("k", k.to_string())])
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST /switch-model?use_local=`
    pub async fn switch_model(&self, use_local: bool) -> Result<SwitchModelResponse, BackendError> {
        let url = self.endpoint(&["switch-model"])?;
        tracing::info!(%url, use_local, "switching backend model");
        let response = self
            .client
            .post(url)
            .query(&[("use_local", use_local)])
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl ChatBackend for BackendClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let url = self.endpoint(&["chat"])?;
        tracing::debug!(%url, session_id = ?request.session_id, use_rag = request.use_rag, "POST");
        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
        let url = self.endpoint(&["chat", "stream"])?;
        tracing::debug!(%url, session_id = ?request.session_id, use_rag = request.use_rag, "POST");
        let response = self.client.post(url).json(request).send().await?;
        let response = Self::check(response).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(BackendError::from))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> BackendClient {
        let mut config = Config::default();
        config.set_backend_url(url);
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn builds_endpoint_urls() {
        let backend = client("http://localhost:8000/");
        assert_eq!(
            backend.endpoint(&["chat", "stream"]).unwrap().as_str(),
            "http://localhost:8000/chat/stream"
        );
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }

    #[test]
    fn keeps_base_path_prefix() {
        let backend = client("http://gateway.local/collegegpt");
        assert_eq!(
            backend.endpoint(&["health"]).unwrap().as_str(),
            "http://gateway.local/collegegpt/health"
        );
    }

    #[test]
    fn escapes_session_ids() {
        let backend = client("http://localhost:8000");
        assert_eq!(
            backend.endpoint(&["session", "a b/c"]).unwrap().as_str(),
            "http://localhost:8000/session/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_unusable_urls() {
        let mut config = Config::default();
        config.backend_url = "not a url".to_string();
        assert!(matches!(
            BackendClient::new(&config),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn chat_request_wire_format() {
        let request = ChatRequest::new("When does the library open?", Some("abc".into()), true);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query": "When does the library open?",
                "session_id": "abc",
                "use_rag": true
            })
        );
    }

    #[test]
    fn model_info_tolerates_missing_fields() {
        let info: ModelInfo =
            serde_json::from_str(r#"{"model_type":"groq","status":"active","model_name":"llama-3.1-8b-instant"}"#)
                .unwrap();
        assert_eq!(info.model_name.as_deref(), Some("llama-3.1-8b-instant"));
        assert!(info.device.is_none());
    }
}
