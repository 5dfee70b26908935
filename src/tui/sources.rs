//! Entity list data sources backed by the forum API.
//!
//! The search endpoints name their arrays after the domain (`threads`,
//! `posts`); each source maps its payload into the generic
//! [`SearchResult`] and turns API errors into the `None` failure signal.

use async_trait::async_trait;
use tracing::warn;

use crate::api::{Envelope, ForumClient, PageQuery, Post, PostSearch, Thread, ThreadSearch};
use crate::tui::components::lists::{SearchEntity, SearchOptions, SearchOutcome, SearchResult};

impl From<ThreadSearch> for SearchResult<Thread> {
    fn from(search: ThreadSearch) -> Self {
        SearchResult::new(search.threads, search.matched_count)
    }
}

impl From<PostSearch> for SearchResult<Post> {
    fn from(search: PostSearch) -> Self {
        SearchResult::new(search.posts, search.matched_count)
    }
}

impl From<SearchOptions> for PageQuery {
    fn from(options: SearchOptions) -> Self {
        PageQuery {
            offset: options.offset,
            limit: options.limit,
        }
    }
}

fn into_outcome<R, T>(envelope: Envelope<R>) -> SearchOutcome<T>
where
    R: Into<SearchResult<T>>,
{
    SearchOutcome::new(envelope.result.into()).with_session_user(envelope.session_user)
}

/// Threads of one board
#[derive(Debug, Clone)]
pub struct ThreadSource {
    client: ForumClient,
    board_id: i64,
}

impl ThreadSource {
    pub fn new(client: ForumClient, board_id: i64) -> Self {
        Self { client, board_id }
    }
}

#[async_trait]
impl SearchEntity<Thread> for ThreadSource {
    async fn search(&self, options: SearchOptions) -> Option<SearchOutcome<Thread>> {
        match self.client.search_threads(self.board_id, options.into()).await {
            Ok(envelope) => Some(into_outcome(envelope)),
            Err(e) => {
                warn!(board_id = self.board_id, offset = options.offset, "thread search failed: {}", e);
                None
            }
        }
    }
}

/// Posts of one thread
#[derive(Debug, Clone)]
pub struct PostSource {
    client: ForumClient,
    thread_id: i64,
}

impl PostSource {
    pub fn new(client: ForumClient, thread_id: i64) -> Self {
        Self { client, thread_id }
    }
}

#[async_trait]
impl SearchEntity<Post> for PostSource {
    async fn search(&self, options: SearchOptions) -> Option<SearchOutcome<Post>> {
        match self.client.search_posts(self.thread_id, options.into()).await {
            Ok(envelope) => Some(into_outcome(envelope)),
            Err(e) => {
                warn!(thread_id = self.thread_id, offset = options.offset, "post search failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientOptions;

    #[test]
    fn test_thread_payload_maps_to_generic_result() {
        let envelope: Envelope<ThreadSearch> = serde_json::from_str(
            r#"{
                "result": {
                    "threads": [
                        {"id": 1, "boardId": 2, "title": "Hi", "createdAt": "2024-01-01T00:00:00Z"}
                    ],
                    "matchedCount": 31,
                    "returnCount": 1
                },
                "sessionUser": {"id": 5, "username": "sam"}
            }"#,
        )
        .unwrap();

        let outcome: SearchOutcome<Thread> = into_outcome(envelope);
        assert_eq!(outcome.result.matched_count, 31);
        assert_eq!(outcome.result.entities[0].title, "Hi");
        assert_eq!(outcome.session_user.map(|u| u.username), Some("sam".to_string()));
    }

    #[test]
    fn test_post_payload_maps_to_generic_result() {
        let envelope: Envelope<PostSearch> = serde_json::from_str(
            r#"{"result": {"posts": [], "matchedCount": 0}}"#,
        )
        .unwrap();

        let outcome: SearchOutcome<Post> = into_outcome(envelope);
        assert!(outcome.result.entities.is_empty());
        assert_eq!(outcome.session_user, None);
    }

    #[test]
    fn test_options_become_query() {
        let query: PageQuery = SearchOptions { offset: 20, limit: 10 }.into();
        assert_eq!(query, PageQuery { offset: 20, limit: 10 });
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_failed_search() {
        // Bind an ephemeral port and release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = ForumClient::new(
            &format!("http://127.0.0.1:{}/api", port),
            ClientOptions {
                timeout_seconds: 2,
                ..ClientOptions::default()
            },
        )
        .unwrap();

        let source = ThreadSource::new(client, 1);
        let outcome = source.search(SearchOptions { offset: 0, limit: 10 }).await;
        assert!(outcome.is_none());
    }
}
