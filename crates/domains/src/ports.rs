//! # Ports
//!
//! Everything the board client touches outside itself goes through one of
//! these traits. Adapters live in `api-adapters`, `auth-adapters` and the
//! binary; tests use the mockall doubles behind the `testing` feature.

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::models::{AdminAssertion, NewPost, NewReply, Post, PostId, ReplyId};
use crate::session::{CurrentUser, Session};

/// The remote posts API.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardApi: Send + Sync {
    /// `GET /api/posts`
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// `POST /api/posts`
    async fn create_post(&self, post: &NewPost) -> Result<(), ApiError>;

    /// `DELETE /api/posts/{id}`
    async fn delete_post(&self, id: &PostId, assertion: &AdminAssertion) -> Result<(), ApiError>;

    /// `POST /api/posts/{id}/reply`
    async fn create_reply(&self, post_id: &PostId, reply: &NewReply) -> Result<(), ApiError>;

    /// `DELETE /api/posts/{id}/reply/{replyId}`
    async fn delete_reply(
        &self,
        post_id: &PostId,
        reply_id: &ReplyId,
        assertion: &AdminAssertion,
    ) -> Result<(), ApiError>;
}

/// Client-side storage holding the current-user record.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// `None` when nothing is stored or the record is unreadable.
    fn current_user(&self) -> Option<CurrentUser>;

    fn session(&self) -> Session {
        Session::new(self.current_user())
    }
}

/// Blocking user notifications: alerts and yes/no confirmations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Interaction: Send + Sync {
    fn alert(&self, message: &str);

    fn confirm(&self, message: &str) -> bool;
}

/// The element the post list is rendered into. Each call replaces the
/// previous contents wholesale.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PostsContainer: Send + Sync {
    fn replace(&self, html: &str);
}
