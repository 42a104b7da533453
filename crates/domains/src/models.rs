//! # Domain Models
//!
//! Posts and replies are snapshots owned by the remote API. The client
//! decodes them leniently (missing text fields become empty, a missing or
//! unreadable timestamp or image becomes `None`, an undecodable reply is
//! dropped) and never mutates them locally.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Opaque identifier of a post. The API may send a number or a string;
/// the client only ever echoes it back in request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

/// Opaque identifier of a reply, unique within its parent post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReplyId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ReplyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ReplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opaque_id(deserializer).map(Self)
    }
}

impl<'de> Deserialize<'de> for ReplyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opaque_id(deserializer).map(Self)
    }
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or numeric id, found {other}"
        ))),
    }
}

/// A top-level entry on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Base64 data URL (or any URL the server chose to store). Anything
    /// that is not a string reads as no image.
    #[serde(default, deserialize_with = "string_or_none")]
    pub image: Option<String>,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Server-provided order is preserved. Replies that fail to decode
    /// are left out rather than failing the post.
    #[serde(default, deserialize_with = "decodable_replies")]
    pub replies: Vec<Reply>,
}

/// An entry nested under a single post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, with = "timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of `POST /api/posts`. `image` is sent as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub author: String,
    pub content: String,
    pub image: Option<String>,
}

/// Body of `POST /api/posts/{id}/reply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReply {
    pub author: String,
    pub content: String,
}

/// Body of both delete endpoints.
///
/// The flag is asserted by the client and carries no proof. The server
/// must re-check privileges on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminAssertion {
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl AdminAssertion {
    pub fn asserted() -> Self {
        Self { is_admin: true }
    }
}

/// An image file picked for upload, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    /// MIME type reported by whoever picked the file, if any.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Contents of the "new post" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub image: Option<ImageFile>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageFile) -> Self {
        self.image = Some(image);
        self
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.image = None;
    }
}

/// Contents of the reply box under one post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub post_id: PostId,
    pub content: String,
}

impl ReplyDraft {
    pub fn new(post_id: PostId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            content: content.into(),
        }
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn decodable_replies<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Reply>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Lenient timestamp codec: RFC 3339 strings, naive date-times (read as
/// UTC), plain dates, or epoch milliseconds. Anything else decodes to `None`.
pub mod timestamp {
    use super::*;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(parse(&Value::deserialize(deserializer)?))
    }

    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(ms) => from_millis(ms),
                None => n.as_f64().and_then(|ms| from_millis(ms as i64)),
            },
            Value::String(s) => parse_str(s.trim()),
            _ => None,
        }
    }

    fn parse_str(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.with_timezone(&Utc));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
        s.parse::<i64>().ok().and_then(from_millis)
    }

    fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(ms).single()
    }
}
