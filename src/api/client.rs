//! HTTP client for the forum REST API

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, RequestBuilder, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::{
    errors::{ApiError, ApiResult},
    types::{
        BoardList, Credentials, Envelope, NewPost, NewThread, PageQuery, Post, PostBody,
        PostSearch, ProfileField, SessionBody, Thread, ThreadBody, ThreadSearch, User, UserBody,
    },
};
use crate::config::Config;

/// Client options derived from configuration
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            user_agent: format!("forumterm/{}", crate::version::VERSION),
        }
    }
}

/// Thin REST client. Cloning is cheap and clones share the cookie jar.
#[derive(Debug, Clone)]
pub struct ForumClient {
    client: Client,
    base_url: String,
}

impl ForumClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str, options: ClientOptions) -> ApiResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "API URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from application configuration
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        let options = ClientOptions {
            timeout_seconds: config.request_timeout_secs,
            ..ClientOptions::default()
        };
        Self::new(&config.api_url, options)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// List all boards
    pub async fn list_boards(&self) -> ApiResult<Envelope<BoardList>> {
        self.send(self.client.get(self.endpoint("boards"))).await
    }

    /// Search the threads of a board, one page at a time
    pub async fn search_threads(
        &self,
        board_id: i64,
        query: PageQuery,
    ) -> ApiResult<Envelope<ThreadSearch>> {
        let url = self.endpoint(&format!("boards/{}/threads", board_id));
        self.send(self.client.get(url).query(&query)).await
    }

    /// Start a new thread on a board
    pub async fn create_thread(&self, board_id: i64, thread: &NewThread) -> ApiResult<Thread> {
        let url = self.endpoint(&format!("boards/{}/threads", board_id));
        let body: ThreadBody = self.send(self.client.post(url).json(thread)).await?;
        Ok(body.thread)
    }

    /// Search the posts of a thread, one page at a time
    pub async fn search_posts(
        &self,
        thread_id: i64,
        query: PageQuery,
    ) -> ApiResult<Envelope<PostSearch>> {
        let url = self.endpoint(&format!("threads/{}/posts", thread_id));
        self.send(self.client.get(url).query(&query)).await
    }

    /// Reply to a thread
    pub async fn create_post(&self, thread_id: i64, post: &NewPost) -> ApiResult<Post> {
        let url = self.endpoint(&format!("threads/{}/posts", thread_id));
        let body: PostBody = self.send(self.client.post(url).json(post)).await?;
        Ok(body.post)
    }

    /// Fetch the user bound to the current session cookie, if any
    pub async fn session_user(&self) -> ApiResult<Option<User>> {
        let body: SessionBody = self.send(self.client.get(self.endpoint("session"))).await?;
        Ok(body.session_user)
    }

    pub async fn login(&self, credentials: &Credentials) -> ApiResult<User> {
        debug!(username = %credentials.username, "logging in");
        let request = self.client.post(self.endpoint("session")).json(credentials);
        let body: SessionBody = self.send(request).await?;
        body.session_user.ok_or(ApiError::Unauthorized)
    }

    pub async fn logout(&self) -> ApiResult<()> {
        let response = self.client.delete(self.endpoint("session")).send().await?;
        Self::check_status(response).await.map(|_| ())
    }

    /// Update one profile field and return the updated user
    pub async fn update_user_field(
        &self,
        user_id: i64,
        field: ProfileField,
        value: &str,
    ) -> ApiResult<User> {
        let url = self.endpoint(&format!("users/{}", user_id));
        let mut patch = serde_json::Map::new();
        patch.insert(field.wire_name().to_string(), json!(value));
        let body: UserBody = self
            .send(self.client.patch(url).json(&serde_json::Value::Object(patch)))
            .await?;
        Ok(body.user)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message_from_body(&text);
        warn!(status = status.as_u16(), %message, "forum API request failed");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human readable message out of an error response body
pub fn error_message_from_body(text: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        let message = json
            .get("error")
            .and_then(|error| error.get("message").or(Some(error)))
            .or_else(|| json.get("message"))
            .and_then(|message| message.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = ForumClient::new("ftp://forum.example", ClientOptions::default()).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = ForumClient::new("http://localhost:3000/api/", ClientOptions::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.endpoint("/boards"), "http://localhost:3000/api/boards");
        assert_eq!(
            client.endpoint("threads/4/posts"),
            "http://localhost:3000/api/threads/4/posts"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message_from_body(r#"{"error": {"message": "Title is required"}}"#),
            "Title is required"
        );
        assert_eq!(error_message_from_body(r#"{"error": "Forbidden"}"#), "Forbidden");
        assert_eq!(error_message_from_body(r#"{"message": "Not found"}"#), "Not found");
        assert_eq!(error_message_from_body("  gateway timeout \n"), "gateway timeout");
        assert_eq!(error_message_from_body(""), "no details");
    }
}
