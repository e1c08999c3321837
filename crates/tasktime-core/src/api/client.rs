//! Async REST client for the optional sync backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::error::ApiError;
use super::types::*;
use crate::storage::ApiConfig;
use crate::task::{Category, Task, TimerSession};

const PLATFORM_HEADER: &str = "X-Client-Platform";
const VERSION_HEADER: &str = "X-Client-Version";

/// Client for the remote API.
///
/// Cloning is cheap and clones share the bearer token, so a 401 seen by one
/// clone signs all of them out.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    platform: String,
    client_version: String,
    token: Arc<Mutex<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::invalid_url(&base_url, &e))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::from_transport(&e))?;
        Ok(Self {
            http,
            base_url,
            platform: config.platform.clone(),
            client_version: config.client_version.clone(),
            token: Arc::new(Mutex::new(None)),
        })
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<ApiResponse<TaskPage>, ApiError> {
        self.send(self.builder(Method::GET, "/tasks")?.query(query)).await
    }

    pub async fn get_task(&self, id: &str) -> Result<ApiResponse<Task>, ApiError> {
        self.get(&format!("/tasks/{id}")).await
    }

    pub async fn create_task(&self, body: &CreateTaskRequest) -> Result<ApiResponse<Task>, ApiError> {
        self.with_body(Method::POST, "/tasks", body).await
    }

    pub async fn update_task(&self, id: &str, body: &UpdateTaskRequest) -> Result<ApiResponse<Task>, ApiError> {
        self.with_body(Method::PUT, &format!("/tasks/{id}"), body).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.delete(&format!("/tasks/{id}")).await
    }

    /// Upload the full local task list.
    pub async fn sync_tasks(&self, tasks: &[Task]) -> Result<ApiResponse<TaskList>, ApiError> {
        self.with_body(Method::POST, "/tasks/sync", &json!({ "tasks": tasks })).await
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub async fn list_sessions(&self, query: &SessionQuery) -> Result<ApiResponse<SessionPage>, ApiError> {
        self.send(self.builder(Method::GET, "/sessions")?.query(query)).await
    }

    pub async fn get_session(&self, id: &str) -> Result<ApiResponse<TimerSession>, ApiError> {
        self.get(&format!("/sessions/{id}")).await
    }

    pub async fn start_session(&self, body: &StartSessionRequest) -> Result<ApiResponse<TimerSession>, ApiError> {
        self.with_body(Method::POST, "/sessions", body).await
    }

    pub async fn pause_session(
        &self,
        id: &str,
        body: &PauseSessionRequest,
    ) -> Result<ApiResponse<TimerSession>, ApiError> {
        self.with_body(Method::PUT, &format!("/sessions/{id}/pause"), body).await
    }

    pub async fn resume_session(
        &self,
        id: &str,
        body: &ResumeSessionRequest,
    ) -> Result<ApiResponse<TimerSession>, ApiError> {
        self.with_body(Method::PUT, &format!("/sessions/{id}/resume"), body).await
    }

    pub async fn stop_session(
        &self,
        id: &str,
        body: &StopSessionRequest,
    ) -> Result<ApiResponse<TimerSession>, ApiError> {
        self.with_body(Method::PUT, &format!("/sessions/{id}/stop"), body).await
    }

    pub async fn delete_session(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.delete(&format!("/sessions/{id}")).await
    }

    pub async fn sync_sessions(&self, sessions: &[TimerSession]) -> Result<ApiResponse<SessionList>, ApiError> {
        self.with_body(Method::POST, "/sessions/sync", &json!({ "sessions": sessions }))
            .await
    }

    // ── Categories ───────────────────────────────────────────────────

    pub async fn list_categories(&self) -> Result<ApiResponse<Vec<Category>>, ApiError> {
        self.get("/categories").await
    }

    pub async fn get_category(&self, id: &str) -> Result<ApiResponse<Category>, ApiError> {
        self.get(&format!("/categories/{id}")).await
    }

    pub async fn create_category(&self, body: &CreateCategoryRequest) -> Result<ApiResponse<Category>, ApiError> {
        self.with_body(Method::POST, "/categories", body).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        body: &UpdateCategoryRequest,
    ) -> Result<ApiResponse<Category>, ApiError> {
        self.with_body(Method::PUT, &format!("/categories/{id}"), body).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.delete(&format!("/categories/{id}")).await
    }

    pub async fn sync_categories(&self, categories: &[Category]) -> Result<ApiResponse<CategoryList>, ApiError> {
        self.with_body(Method::POST, "/categories/sync", &json!({ "categories": categories }))
            .await
    }

    // ── Stats ────────────────────────────────────────────────────────

    pub async fn stats(&self, query: &StatsQuery) -> Result<ApiResponse<UserStats>, ApiError> {
        self.send(self.builder(Method::GET, "/stats")?.query(query)).await
    }

    pub async fn daily_stats(&self, query: &StatsQuery) -> Result<ApiResponse<Vec<DailyStats>>, ApiError> {
        self.send(self.builder(Method::GET, "/stats/daily")?.query(query)).await
    }

    pub async fn weekly_stats(&self, query: &StatsQuery) -> Result<ApiResponse<Vec<WeeklyStats>>, ApiError> {
        self.send(self.builder(Method::GET, "/stats/weekly")?.query(query)).await
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.send(self.builder(Method::GET, path)?).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.send(self.builder(Method::DELETE, path)?).await
    }

    async fn with_body<T, B>(&self, method: Method, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(self.builder(method, path)?.json(body)).await
    }

    fn builder(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let raw = format!("{}{path}", self.base_url);
        let url = Url::parse(&raw).map_err(|e| ApiError::invalid_url(&raw, &e))?;
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(PLATFORM_HEADER, &self.platform)
            .header(VERSION_HEADER, &self.client_version);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await.map_err(|e| {
            let err = ApiError::from_transport(&e);
            warn!(kind = ?err.kind, "request failed: {e}");
            err
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        if !status.is_success() {
            let body = serde_json::from_str(&text).unwrap_or(Value::Null);
            let err = ApiError::from_response(status.as_u16(), &body);
            if err.is_unauthorized() {
                warn!("unauthorized response, clearing credentials");
                self.set_token(None);
            }
            return Err(err);
        }

        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::invalid_body(status.as_u16(), &e))?
        };
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let data = serde_json::from_value(body.get("data").cloned().unwrap_or(Value::Null))
            .map_err(|e| ApiError::invalid_body(status.as_u16(), &e))?;
        debug!(status = status.as_u16(), "api response");

        Ok(ApiResponse {
            data,
            status: status.as_u16(),
            message,
            success: true,
        })
    }
}
