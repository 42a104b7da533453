//! # Board Client
//!
//! Coordinates the render-and-refresh cycle. Loads never fail past their
//! own boundary; they leave either the post list or an inline error in the
//! container. Mutations validate locally, call the API, and on success
//! re-fetch the whole list instead of patching it.

use std::sync::{Arc, Mutex, MutexGuard};

use domains::{
    AdminAssertion, ApiError, BoardApi, ClientError, Interaction, NewPost, NewReply, PostDraft,
    PostId, PostsContainer, ReplyDraft, ReplyId, Result, Session,
};
use tracing::{debug, error, info, instrument};

use crate::data_url;
use crate::render;
use crate::view::{self, ViewOptions};

/// User-facing messages.
pub mod messages {
    pub const EMPTY_POST: &str = "Please enter a post before submitting";
    pub const EMPTY_REPLY: &str = "Please enter a reply before submitting";
    pub const LOGIN_TO_POST: &str = "Please login to post";
    pub const LOGIN_TO_REPLY: &str = "Please login to reply";
    pub const ADMIN_ONLY_POSTS: &str = "Only administrators can delete posts";
    pub const ADMIN_ONLY_REPLIES: &str = "Only administrators can delete replies";
    pub const CONFIRM_DELETE_POST: &str = "Are you sure you want to delete this post?";
    pub const CONFIRM_DELETE_REPLY: &str = "Are you sure you want to delete this reply?";
    pub const CREATE_POST_FAILED: &str = "Error creating post";
    pub const DELETE_POST_FAILED: &str = "Error deleting post";
    pub const ADD_REPLY_FAILED: &str = "Error adding reply";
    pub const DELETE_REPLY_FAILED: &str = "Error deleting reply";
}

/// Behaviour switches read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardOptions {
    /// Refuse posts and replies from anonymous sessions.
    pub require_login_to_post: bool,
    pub view: ViewOptions,
}

/// Where the post list currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Rendered(String),
    Failed(String),
}

impl ViewState {
    /// Markup that was put into the container, if any.
    pub fn html(&self) -> Option<&str> {
        match self {
            ViewState::Rendered(html) | ViewState::Failed(html) => Some(html),
            ViewState::Idle | ViewState::Loading => None,
        }
    }
}

/// How a mutation that did not error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted it and the list was reloaded.
    Applied,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
}

pub struct BoardClient {
    api: Arc<dyn BoardApi>,
    interaction: Arc<dyn Interaction>,
    container: Arc<dyn PostsContainer>,
    options: BoardOptions,
    state: Mutex<ViewState>,
}

impl BoardClient {
    pub fn new(
        api: Arc<dyn BoardApi>,
        interaction: Arc<dyn Interaction>,
        container: Arc<dyn PostsContainer>,
        options: BoardOptions,
    ) -> Self {
        Self {
            api,
            interaction,
            container,
            options,
            state: Mutex::new(ViewState::Idle),
        }
    }

    pub fn state(&self) -> ViewState {
        self.lock_state().clone()
    }

    /// Fetches every post and replaces the container contents.
    ///
    /// Overlapping calls are not de-duplicated; whichever finishes last
    /// owns the container.
    #[instrument(skip_all, fields(admin = session.is_admin()))]
    pub async fn load_posts(&self, session: &Session) -> ViewState {
        self.set_state(ViewState::Loading);

        let next = match self.api.list_posts().await {
            Ok(posts) => {
                debug!(count = posts.len(), "fetched posts");
                let board = view::build(posts, session, &self.options.view);
                ViewState::Rendered(render::to_html(&view::board_nodes(&board)))
            }
            Err(e) => {
                error!(error = %e, "Error loading posts");
                ViewState::Failed(render::to_html(&view::error_nodes()))
            }
        };

        if let Some(html) = next.html() {
            self.container.replace(html);
        }
        self.set_state(next.clone());
        next
    }

    /// Creates a post from the draft. The draft is cleared only on success.
    #[instrument(skip_all, fields(has_image = draft.image.is_some()))]
    pub async fn submit_post(
        &self,
        session: &Session,
        draft: &mut PostDraft,
    ) -> Result<MutationOutcome> {
        if self.options.require_login_to_post && !session.is_logged_in() {
            return Err(self.reject(ClientError::Unauthorized(
                messages::LOGIN_TO_POST.to_string(),
            )));
        }

        let content = draft.content.trim();
        if content.is_empty() {
            return Err(self.reject(ClientError::Validation(messages::EMPTY_POST.to_string())));
        }

        let body = NewPost {
            author: session.author_name().to_string(),
            content: content.to_string(),
            image: draft.image.as_ref().map(data_url::encode),
        };

        match self.api.create_post(&body).await {
            Ok(()) => {
                info!(author = %body.author, "post created");
                draft.clear();
                self.load_posts(session).await;
                Ok(MutationOutcome::Applied)
            }
            Err(e) => Err(self.fail(messages::CREATE_POST_FAILED, e)),
        }
    }

    #[instrument(skip_all, fields(post_id = %post_id))]
    pub async fn delete_post(&self, session: &Session, post_id: &PostId) -> Result<MutationOutcome> {
        if !session.is_admin() {
            return Err(self.reject(ClientError::Forbidden(
                messages::ADMIN_ONLY_POSTS.to_string(),
            )));
        }
        if !self.interaction.confirm(messages::CONFIRM_DELETE_POST) {
            debug!("deletion cancelled");
            return Ok(MutationOutcome::Cancelled);
        }

        match self.api.delete_post(post_id, &AdminAssertion::asserted()).await {
            Ok(()) => {
                info!("post deleted");
                self.load_posts(session).await;
                Ok(MutationOutcome::Applied)
            }
            Err(e) => Err(self.fail(messages::DELETE_POST_FAILED, e)),
        }
    }

    /// Adds a reply under `draft.post_id`. The draft is cleared only on success.
    #[instrument(skip_all, fields(post_id = %draft.post_id))]
    pub async fn submit_reply(
        &self,
        session: &Session,
        draft: &mut ReplyDraft,
    ) -> Result<MutationOutcome> {
        if self.options.require_login_to_post && !session.is_logged_in() {
            return Err(self.reject(ClientError::Unauthorized(
                messages::LOGIN_TO_REPLY.to_string(),
            )));
        }

        let content = draft.content.trim();
        if content.is_empty() {
            return Err(self.reject(ClientError::Validation(messages::EMPTY_REPLY.to_string())));
        }

        let body = NewReply {
            author: session.author_name().to_string(),
            content: content.to_string(),
        };

        match self.api.create_reply(&draft.post_id, &body).await {
            Ok(()) => {
                info!(author = %body.author, "reply added");
                draft.clear();
                self.load_posts(session).await;
                Ok(MutationOutcome::Applied)
            }
            Err(e) => Err(self.fail(messages::ADD_REPLY_FAILED, e)),
        }
    }

    #[instrument(skip_all, fields(post_id = %post_id, reply_id = %reply_id))]
    pub async fn delete_reply(
        &self,
        session: &Session,
        post_id: &PostId,
        reply_id: &ReplyId,
    ) -> Result<MutationOutcome> {
        if !session.is_admin() {
            return Err(self.reject(ClientError::Forbidden(
                messages::ADMIN_ONLY_REPLIES.to_string(),
            )));
        }
        if !self.interaction.confirm(messages::CONFIRM_DELETE_REPLY) {
            debug!("deletion cancelled");
            return Ok(MutationOutcome::Cancelled);
        }

        match self
            .api
            .delete_reply(post_id, reply_id, &AdminAssertion::asserted())
            .await
        {
            Ok(()) => {
                info!("reply deleted");
                self.load_posts(session).await;
                Ok(MutationOutcome::Applied)
            }
            Err(e) => Err(self.fail(messages::DELETE_REPLY_FAILED, e)),
        }
    }

    /// Local refusal: tell the user, send nothing.
    fn reject(&self, err: ClientError) -> ClientError {
        debug!(error = %err, "rejected before sending");
        self.interaction.alert(&err_message(&err));
        err
    }

    /// Remote failure: generic alert, detail only in the log.
    fn fail(&self, message: &str, err: ApiError) -> ClientError {
        error!(error = %err, "{message}");
        self.interaction.alert(message);
        ClientError::Api(err)
    }

    fn set_state(&self, next: ViewState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, ViewState> {
        // A panic elsewhere cannot leave a ViewState half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn err_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(msg) | ClientError::Unauthorized(msg) | ClientError::Forbidden(msg) => {
            msg.clone()
        }
        ClientError::Api(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{CurrentUser, ImageFile, MockBoardApi, MockInteraction, MockPostsContainer, Post};
    use mockall::{predicate::*, Sequence};
    use serde_json::json;

    fn sample_posts() -> Vec<Post> {
        serde_json::from_value(json!([
            { "id": 1, "author": "old", "content": "first", "timestamp": "2024-01-01T00:00:00Z", "replies": [] },
            { "id": 2, "author": "new", "content": "second", "timestamp": "2024-02-01T00:00:00Z",
              "replies": [{ "id": 10, "author": "bob", "content": "hey", "timestamp": "2024-02-02T00:00:00Z" }] }
        ]))
        .unwrap()
    }

    fn alice() -> Session {
        Session::from(CurrentUser::new("alice", false))
    }

    fn admin() -> Session {
        Session::from(CurrentUser::new("root", true))
    }

    fn quiet_container() -> MockPostsContainer {
        let mut container = MockPostsContainer::new();
        container.expect_replace().return_const(());
        container
    }

    fn client(api: MockBoardApi, interaction: MockInteraction, container: MockPostsContainer) -> BoardClient {
        client_with(api, interaction, container, BoardOptions::default())
    }

    fn client_with(
        api: MockBoardApi,
        interaction: MockInteraction,
        container: MockPostsContainer,
        options: BoardOptions,
    ) -> BoardClient {
        BoardClient::new(Arc::new(api), Arc::new(interaction), Arc::new(container), options)
    }

    #[tokio::test]
    async fn load_renders_newest_post_first() {
        let mut api = MockBoardApi::new();
        api.expect_list_posts().times(1).returning(|| Ok(sample_posts()));
        let mut container = MockPostsContainer::new();
        container
            .expect_replace()
            .withf(|html: &str| {
                let newer = html.find("second").unwrap_or(usize::MAX);
                let older = html.find("first").unwrap_or(0);
                newer < older
            })
            .times(1)
            .return_const(());

        let client = client(api, MockInteraction::new(), container);
        let state = client.load_posts(&alice()).await;

        assert!(matches!(state, ViewState::Rendered(_)));
        assert_eq!(client.state(), state);
    }

    #[tokio::test]
    async fn load_failure_renders_inline_error() {
        let mut api = MockBoardApi::new();
        api.expect_list_posts()
            .times(1)
            .returning(|| Err(ApiError::Status(503)));
        let mut container = MockPostsContainer::new();
        container
            .expect_replace()
            .with(eq(r#"<p class="error">Error loading posts</p>"#))
            .times(1)
            .return_const(());

        let client = client(api, MockInteraction::new(), container);
        let state = client.load_posts(&Session::anonymous()).await;
        assert!(matches!(state, ViewState::Failed(_)));
    }

    #[tokio::test]
    async fn empty_post_is_rejected_without_request() {
        let mut api = MockBoardApi::new();
        api.expect_create_post().never();
        api.expect_list_posts().never();
        let mut interaction = MockInteraction::new();
        interaction
            .expect_alert()
            .with(eq(messages::EMPTY_POST))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let mut draft = PostDraft::new("   \n\t ");
        let err = client.submit_post(&alice(), &mut draft).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(draft.content, "   \n\t ");
    }

    #[tokio::test]
    async fn post_without_image_sends_null_image_then_reloads() {
        let mut seq = Sequence::new();
        let mut api = MockBoardApi::new();
        api.expect_create_post()
            .withf(|body: &NewPost| {
                body.author == "Anonymous" && body.content == "hello" && body.image.is_none()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        api.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![]));

        let client = client(api, MockInteraction::new(), quiet_container());
        let mut draft = PostDraft::new("  hello  ");
        let outcome = client.submit_post(&Session::anonymous(), &mut draft).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert!(draft.content.is_empty());
    }

    #[tokio::test]
    async fn post_with_image_sends_data_url_and_username() {
        let mut api = MockBoardApi::new();
        api.expect_create_post()
            .withf(|body: &NewPost| {
                body.author == "alice"
                    && body.image.as_deref() == Some("data:image/png;base64,aGk=")
            })
            .times(1)
            .returning(|_| Ok(()));
        api.expect_list_posts().times(1).returning(|| Ok(vec![]));

        let client = client(api, MockInteraction::new(), quiet_container());
        let mut draft = PostDraft::new("pic").with_image(ImageFile {
            file_name: "cat.png".into(),
            content_type: None,
            bytes: b"hi".to_vec().into(),
        });
        client.submit_post(&alice(), &mut draft).await.unwrap();
        assert!(draft.image.is_none());
    }

    #[tokio::test]
    async fn failed_post_alerts_and_keeps_draft() {
        let mut api = MockBoardApi::new();
        api.expect_create_post()
            .times(1)
            .returning(|_| Err(ApiError::Transport("connection refused".into())));
        api.expect_list_posts().never();
        let mut interaction = MockInteraction::new();
        interaction
            .expect_alert()
            .with(eq(messages::CREATE_POST_FAILED))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let mut draft = PostDraft::new("keep me");
        let err = client.submit_post(&alice(), &mut draft).await.unwrap_err();

        assert!(!err.is_local());
        assert_eq!(draft.content, "keep me");
    }

    #[tokio::test]
    async fn login_requirement_blocks_anonymous_posts() {
        let mut api = MockBoardApi::new();
        api.expect_create_post().never();
        let mut interaction = MockInteraction::new();
        interaction
            .expect_alert()
            .with(eq(messages::LOGIN_TO_POST))
            .times(1)
            .return_const(());

        let options = BoardOptions {
            require_login_to_post: true,
            ..BoardOptions::default()
        };
        let client = client_with(api, interaction, MockPostsContainer::new(), options);
        let err = client
            .submit_post(&Session::anonymous(), &mut PostDraft::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn non_admin_delete_never_reaches_the_api() {
        let mut api = MockBoardApi::new();
        api.expect_delete_post().never();
        api.expect_delete_reply().never();
        let mut interaction = MockInteraction::new();
        interaction.expect_confirm().never();
        interaction
            .expect_alert()
            .with(eq(messages::ADMIN_ONLY_POSTS))
            .times(1)
            .return_const(());
        interaction
            .expect_alert()
            .with(eq(messages::ADMIN_ONLY_REPLIES))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let post = PostId::new("1");
        let err = client.delete_post(&alice(), &post).await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        let err = client
            .delete_reply(&Session::anonymous(), &post, &ReplyId::new("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
    }

    #[tokio::test]
    async fn declined_confirmation_cancels_delete() {
        let mut api = MockBoardApi::new();
        api.expect_delete_post().never();
        let mut interaction = MockInteraction::new();
        interaction
            .expect_confirm()
            .with(eq(messages::CONFIRM_DELETE_POST))
            .times(1)
            .return_const(false);

        let client = client(api, interaction, MockPostsContainer::new());
        let outcome = client.delete_post(&admin(), &PostId::new("1")).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Cancelled);
    }

    #[tokio::test]
    async fn admin_delete_asserts_flag_then_reloads() {
        let mut seq = Sequence::new();
        let mut api = MockBoardApi::new();
        api.expect_delete_reply()
            .withf(|post: &PostId, reply: &ReplyId, assertion: &AdminAssertion| {
                post.as_str() == "2" && reply.as_str() == "10" && assertion.is_admin
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        api.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(sample_posts()));
        let mut interaction = MockInteraction::new();
        interaction.expect_confirm().times(1).return_const(true);

        let client = client(api, interaction, quiet_container());
        let outcome = client
            .delete_reply(&admin(), &PostId::new("2"), &ReplyId::new("10"))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        let html = client.state().html().map(str::to_owned).unwrap_or_default();
        assert!(html.contains("delete-reply-btn"));
    }

    #[tokio::test]
    async fn failed_delete_alerts_without_reload() {
        let mut api = MockBoardApi::new();
        api.expect_delete_post()
            .times(1)
            .returning(|_, _| Err(ApiError::Status(403)));
        api.expect_list_posts().never();
        let mut interaction = MockInteraction::new();
        interaction.expect_confirm().return_const(true);
        interaction
            .expect_alert()
            .with(eq(messages::DELETE_POST_FAILED))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let err = client.delete_post(&admin(), &PostId::new("1")).await.unwrap_err();
        assert_eq!(err, ClientError::Api(ApiError::Status(403)));
    }

    #[tokio::test]
    async fn reply_is_scoped_to_post_and_clears_input() {
        let mut seq = Sequence::new();
        let mut api = MockBoardApi::new();
        api.expect_create_reply()
            .withf(|post: &PostId, body: &NewReply| {
                post.as_str() == "2" && body.author == "alice" && body.content == "me too"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_list_posts()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![]));

        let client = client(api, MockInteraction::new(), quiet_container());
        let mut draft = ReplyDraft::new(PostId::new("2"), " me too ");
        client.submit_reply(&alice(), &mut draft).await.unwrap();
        assert!(draft.content.is_empty());
    }

    #[tokio::test]
    async fn empty_reply_is_rejected_without_request() {
        let mut api = MockBoardApi::new();
        api.expect_create_reply().never();
        let mut interaction = MockInteraction::new();
        interaction
            .expect_alert()
            .with(eq(messages::EMPTY_REPLY))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let mut draft = ReplyDraft::new(PostId::new("2"), "");
        let err = client.submit_reply(&alice(), &mut draft).await.unwrap_err();
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn failed_reply_alerts() {
        let mut api = MockBoardApi::new();
        api.expect_create_reply()
            .times(1)
            .returning(|_, _| Err(ApiError::Status(500)));
        let mut interaction = MockInteraction::new();
        interaction
            .expect_alert()
            .with(eq(messages::ADD_REPLY_FAILED))
            .times(1)
            .return_const(());

        let client = client(api, interaction, MockPostsContainer::new());
        let mut draft = ReplyDraft::new(PostId::new("2"), "x");
        assert!(client.submit_reply(&alice(), &mut draft).await.is_err());
        assert_eq!(draft.content, "x");
    }

    #[test]
    fn view_state_exposes_container_markup() {
        assert_eq!(ViewState::Idle.html(), None);
        assert_eq!(ViewState::Loading.html(), None);
        assert_eq!(ViewState::Failed("x".into()).html(), Some("x"));
    }
}
