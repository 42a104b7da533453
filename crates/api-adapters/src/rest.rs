//! # REST adapter
//!
//! `BoardApi` over HTTP with reqwest. Any 2xx is success and mutation
//! response bodies are ignored; the client re-fetches instead.

use std::time::Duration;

use async_trait::async_trait;
use domains::{AdminAssertion, ApiError, BoardApi, NewPost, NewReply, Post, PostId, ReplyId};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default API origin when nothing is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct RestBoardApi {
    client: Client,
    base: Url,
}

impl RestBoardApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout: None` leaves requests unbounded.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: expected an http(s) base url"
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends path segments to the base, percent-encoding each one.
    /// A base with a path prefix (`https://host/board/`) keeps it.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl BoardApi for RestBoardApi {
    #[instrument(skip(self))]
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        let url = self.endpoint(&["api", "posts"])?;
        debug!(%url, "GET");
        let body: Value = self
            .send(self.client.get(url))
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        decode_posts(body)
    }

    #[instrument(skip_all)]
    async fn create_post(&self, post: &NewPost) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "posts"])?;
        debug!(%url, "POST");
        self.send(self.client.post(url).json(post)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(post_id = %id))]
    async fn delete_post(&self, id: &PostId, assertion: &AdminAssertion) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "posts", id.as_str()])?;
        debug!(%url, "DELETE");
        self.send(self.client.delete(url).json(assertion)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(post_id = %post_id))]
    async fn create_reply(&self, post_id: &PostId, reply: &NewReply) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "posts", post_id.as_str(), "reply"])?;
        debug!(%url, "POST");
        self.send(self.client.post(url).json(reply)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(post_id = %post_id, reply_id = %reply_id))]
    async fn delete_reply(
        &self,
        post_id: &PostId,
        reply_id: &ReplyId,
        assertion: &AdminAssertion,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "posts", post_id.as_str(), "reply", reply_id.as_str()])?;
        debug!(%url, "DELETE");
        self.send(self.client.delete(url).json(assertion)).await?;
        Ok(())
    }
}

/// A non-array body is treated as an empty board. Each element is decoded
/// on its own; one that does not decode is skipped.
pub fn decode_posts(body: Value) -> Result<Vec<Post>, ApiError> {
    match body {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Post>(item) {
                Ok(post) => Some(post),
                Err(e) => {
                    warn!(index, error = %e, "skipping undecodable post");
                    None
                }
            })
            .collect()),
        other => {
            warn!(kind = json_kind(&other), "post list is not an array; showing no posts");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints_hang_off_the_base() {
        let api = RestBoardApi::new("http://localhost:3000").unwrap();
        assert_eq!(
            api.endpoint(&["api", "posts"]).unwrap().as_str(),
            "http://localhost:3000/api/posts"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let api = RestBoardApi::new("https://example.com/board/?x=1").unwrap();
        assert_eq!(
            api.endpoint(&["api", "posts", "7", "reply", "3"]).unwrap().as_str(),
            "https://example.com/board/api/posts/7/reply/3"
        );
    }

    #[test]
    fn ids_are_percent_encoded_as_single_segments() {
        let api = RestBoardApi::new("http://localhost:3000").unwrap();
        let url = api.endpoint(&["api", "posts", "a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/posts/a%2Fb%3Fc");
    }

    #[test]
    fn rejects_non_http_bases() {
        assert!(matches!(
            RestBoardApi::new("mailto:someone@example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(RestBoardApi::new("not a url"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn non_array_body_decodes_to_empty_board() {
        assert!(decode_posts(json!({ "error": "nope" })).unwrap().is_empty());
        assert!(decode_posts(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn malformed_post_is_skipped_and_the_rest_kept() {
        let posts = decode_posts(json!([
            { "author": "no id" },
            { "id": 1, "author": "a", "content": "ok", "image": 0, "replies": [] },
            { "id": 2, "author": "b", "content": "y",
              "replies": [{ "author": "c", "content": "legacy reply, no id" }] }
        ]))
        .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id.as_str(), "1");
        assert!(posts[0].image.is_none());
        assert_eq!(posts[1].id.as_str(), "2");
        assert!(posts[1].replies.is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) on loopback is closed on any sane test host.
        let api = RestBoardApi::with_timeout("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        assert!(matches!(api.list_posts().await, Err(ApiError::Transport(_))));
    }
}
