//! HTTP client for the hosted agents REST API.
//!
//! Every call is a JSON request against the project endpoint with a bearer
//! token and an `api-version` query parameter. List endpoints are cursor
//! paginated (`has_more` / `last_id` / `after`) and are drained completely.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::traits::AgentBackend;
use super::types::{
    AgentHandle, ListOrder, MessageRef, MessageRole, NewAgent, RunState, RunStep, ThreadHandle,
    ThreadMessage, ToolApproval, ToolResources,
};
use crate::error::{AgentError, AgentResult};

/// Default `api-version` query parameter.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Default limit for a single request, connect to last body byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size requested from list endpoints.
const PAGE_LIMIT: u32 = 100;

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Project endpoint (e.g. "https://acct.services.ai.azure.com/api/projects/demo")
    pub endpoint: String,
    /// Bearer token
    pub access_token: Option<String>,
    /// `api-version` query parameter
    pub api_version: String,
    /// Limit for a single request
    pub request_timeout: Duration,
}

impl HttpBackendConfig {
    /// Create a configuration for an endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Override the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// One page of a list response
#[derive(Debug, Deserialize)]
struct ListPage<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// [`AgentBackend`] over HTTPS.
pub struct HttpBackend {
    http_client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// Create a backend for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when the HTTP client cannot be built.
    pub fn new(config: HttpBackendConfig) -> AgentResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Get the connection settings.
    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(method = method.as_str(), url = url.as_str(), "agent backend request");

        let mut request = self
            .http_client
            .request(method, url)
            .query(&[("api-version", self.config.api_version.as_str())]);

        if let Some(ref token) = self.config.access_token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> AgentResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| AgentError::backend(operation, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => match error.code {
                    Some(code) => format!("HTTP {} - {}: {}", status, code, error.message),
                    None => format!("HTTP {} - {}", status, error.message),
                },
                Err(_) => format!("HTTP {} - {}", status, body.trim()),
            };
            return Err(AgentError::backend(operation, message));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::backend(operation, format!("Failed to parse response: {}", e)))
    }

    async fn list_all<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        order: Option<ListOrder>,
    ) -> AgentResult<Vec<T>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, path)
                .query(&[("limit", PAGE_LIMIT.to_string())]);
            if let Some(order) = order {
                request = request.query(&[("order", order.as_str())]);
            }
            if let Some(ref cursor) = after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let page: ListPage<T> = self.send(operation, request).await?;
            items.extend(page.data);

            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn list_agents(&self) -> AgentResult<Vec<AgentHandle>> {
        self.list_all("list_agents", "assistants", None).await
    }

    async fn create_agent(&self, agent: &NewAgent) -> AgentResult<AgentHandle> {
        let request = self.request(Method::POST, "assistants").json(agent);
        self.send("create_agent", request).await
    }

    async fn delete_agent(&self, agent_id: &str) -> AgentResult<()> {
        let request = self.request(Method::DELETE, &format!("assistants/{}", agent_id));
        let _: Value = self.send("delete_agent", request).await?;
        Ok(())
    }

    async fn create_thread(&self) -> AgentResult<ThreadHandle> {
        let request = self.request(Method::POST, "threads").json(&json!({}));
        self.send("create_thread", request).await
    }

    async fn get_thread(&self, thread_id: &str) -> AgentResult<ThreadHandle> {
        let request = self.request(Method::GET, &format!("threads/{}", thread_id));
        self.send("get_thread", request).await
    }

    async fn delete_thread(&self, thread_id: &str) -> AgentResult<()> {
        let request = self.request(Method::DELETE, &format!("threads/{}", thread_id));
        let _: Value = self.send("delete_thread", request).await?;
        Ok(())
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> AgentResult<MessageRef> {
        let request = self
            .request(Method::POST, &format!("threads/{}/messages", thread_id))
            .json(&json!({ "role": role.as_str(), "content": content }));
        self.send("create_message", request).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: ListOrder,
    ) -> AgentResult<Vec<ThreadMessage>> {
        self.list_all(
            "list_messages",
            &format!("threads/{}/messages", thread_id),
            Some(order),
        )
        .await
    }

    async fn create_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        tool_resources: &ToolResources,
    ) -> AgentResult<RunState> {
        let request = self
            .request(Method::POST, &format!("threads/{}/runs", thread_id))
            .json(&json!({
                "assistant_id": agent_id,
                "tool_resources": tool_resources,
            }));
        self.send("create_run", request).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState> {
        let request = self.request(Method::GET, &format!("threads/{}/runs/{}", thread_id, run_id));
        self.send("get_run", request).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> AgentResult<RunState> {
        let request = self.request(
            Method::POST,
            &format!("threads/{}/runs/{}/cancel", thread_id, run_id),
        );
        self.send("cancel_run", request).await
    }

    async fn submit_tool_approvals(
        &self,
        thread_id: &str,
        run_id: &str,
        approvals: &[ToolApproval],
    ) -> AgentResult<RunState> {
        let request = self
            .request(
                Method::POST,
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            )
            .json(&json!({ "tool_approvals": approvals }));
        self.send("submit_tool_approvals", request).await
    }

    async fn list_run_steps(&self, thread_id: &str, run_id: &str) -> AgentResult<Vec<RunStep>> {
        self.list_all(
            "list_run_steps",
            &format!("threads/{}/runs/{}/steps", thread_id, run_id),
            Some(ListOrder::Asc),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpBackendConfig::new("https://example.com/api/projects/demo")
            .with_token("secret")
            .with_api_version("2025-05-15-preview");
        assert_eq!(config.access_token.as_deref(), Some("secret"));
        assert_eq!(config.api_version, "2025-05-15-preview");
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);

        let default = HttpBackendConfig::new("https://example.com");
        assert_eq!(default.api_version, DEFAULT_API_VERSION);
        assert!(default.access_token.is_none());
    }

    #[test]
    fn test_url_joining() {
        let backend =
            HttpBackend::new(HttpBackendConfig::new("https://example.com/api/projects/demo/")).unwrap();
        assert_eq!(
            backend.url("/threads/t1/runs"),
            "https://example.com/api/projects/demo/threads/t1/runs"
        );
        assert_eq!(backend.url("assistants"), "https://example.com/api/projects/demo/assistants");
    }

    #[test]
    fn test_list_page_parsing() {
        let page: ListPage<AgentHandle> = serde_json::from_value(json!({
            "object": "list",
            "data": [{"id": "asst_1", "name": "search-agent", "model": "gpt-4o"}],
            "first_id": "asst_1",
            "last_id": "asst_1",
            "has_more": false
        }))
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert!(page.data[0].has_name("search-agent"));
        assert!(!page.has_more);
    }

    #[test]
    fn test_error_body_parsing() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error": {"code": "not_found", "message": "No thread found"}}"#,
        )
        .unwrap();
        assert_eq!(body.error.code.as_deref(), Some("not_found"));
        assert_eq!(body.error.message, "No thread found");
    }
}
