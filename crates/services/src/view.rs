//! # View model
//!
//! Turns fetched posts plus the viewer's session into plain display data,
//! then into a node tree for `render`. Ordering and all privilege gating
//! happen here; the tree builder only lays out what it is given.

use domains::{Post, PostId, Reply, ReplyId, Session};

use crate::format::{format_timestamp, TimeDisplay};
use crate::render::{Element, Node};

pub const NO_POSTS: &str = "No posts yet. Be the first to share!";
pub const NO_REPLIES: &str = "No replies yet";
pub const LOAD_ERROR: &str = "Error loading posts";
const DELETE_LABEL: &str = "🗑️ Delete";

/// Knobs the view needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub login_url: String,
    pub time_display: TimeDisplay,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            login_url: "login.html".to_string(),
            time_display: TimeDisplay::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardView {
    Empty,
    Posts(Vec<PostView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub id: PostId,
    pub author: String,
    pub posted_at: String,
    pub content: String,
    pub image: Option<String>,
    pub can_delete: bool,
    pub replies: Vec<ReplyView>,
    pub reply_box: ReplyBox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyView {
    pub id: ReplyId,
    pub author: String,
    pub posted_at: String,
    pub content: String,
    pub can_delete: bool,
}

/// What sits under the reply list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBox {
    Input { input_id: String },
    LoginPrompt { login_url: String },
}

/// Newest first. The sort is stable, so equal timestamps keep the server's
/// order; posts without a timestamp go last.
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub fn build(mut posts: Vec<Post>, session: &Session, options: &ViewOptions) -> BoardView {
    if posts.is_empty() {
        return BoardView::Empty;
    }
    sort_newest_first(&mut posts);
    BoardView::Posts(
        posts
            .into_iter()
            .map(|post| post_view(post, session, options))
            .collect(),
    )
}

fn post_view(post: Post, session: &Session, options: &ViewOptions) -> PostView {
    let admin = session.is_admin();
    let reply_box = if session.is_logged_in() {
        ReplyBox::Input {
            input_id: format!("replyInput{}", post.id),
        }
    } else {
        ReplyBox::LoginPrompt {
            login_url: options.login_url.clone(),
        }
    };

    PostView {
        posted_at: format_timestamp(post.timestamp, options.time_display),
        author: post.author,
        content: post.content,
        image: post.image.filter(|src| is_displayable_image(src)),
        can_delete: admin,
        replies: post
            .replies
            .into_iter()
            .map(|reply| reply_view(reply, admin, options))
            .collect(),
        reply_box,
        id: post.id,
    }
}

fn reply_view(reply: Reply, admin: bool, options: &ViewOptions) -> ReplyView {
    ReplyView {
        id: reply.id,
        posted_at: format_timestamp(reply.timestamp, options.time_display),
        author: reply.author,
        content: reply.content,
        can_delete: admin,
    }
}

/// Image sources are server data; only embedded images and plain web
/// URLs are put into `src`.
fn is_displayable_image(src: &str) -> bool {
    let src = src.trim();
    let lower = src.to_ascii_lowercase();
    !src.is_empty()
        && (lower.starts_with("data:image/")
            || lower.starts_with("http://")
            || lower.starts_with("https://")
            || (src.starts_with('/') && !src.starts_with("//")))
}

// ── Node tree ───────────────────────────────────────────────────────────────

pub fn board_nodes(view: &BoardView) -> Vec<Node> {
    match view {
        BoardView::Empty => vec![Element::new("p").class("no-posts").text(NO_POSTS).into()],
        BoardView::Posts(posts) => posts.iter().map(post_node).collect(),
    }
}

pub fn error_nodes() -> Vec<Node> {
    vec![Element::new("p").class("error").text(LOAD_ERROR).into()]
}

fn post_node(post: &PostView) -> Node {
    let mut header = Element::new("div")
        .class("post-header")
        .child(Element::new("h3").text(&post.author))
        .child(Element::new("span").class("post-time").text(&post.posted_at));
    if post.can_delete {
        header = header.child(
            Element::new("button")
                .class("delete-post-btn")
                .attr("data-action", "delete-post")
                .attr("data-post-id", post.id.as_str())
                .text(DELETE_LABEL),
        );
    }

    let mut article = Element::new("article")
        .class("post")
        .attr("data-post-id", post.id.as_str())
        .child(header)
        .child(Element::new("p").class("post-content").text(&post.content));
    if let Some(src) = &post.image {
        article = article.child(
            Element::new("img")
                .attr("src", src)
                .attr("alt", "Post image")
                .class("post-image"),
        );
    }

    let mut replies = Element::new("div")
        .class("replies")
        .child(Element::new("h4").text("Replies:"));
    if post.replies.is_empty() {
        replies = replies.child(Element::new("p").class("no-replies").text(NO_REPLIES));
    } else {
        replies = replies.children(post.replies.iter().map(|reply| reply_node(&post.id, reply)));
    }
    replies = replies.child(reply_box_node(&post.id, &post.reply_box));

    article.child(replies).into()
}

fn reply_node(post_id: &PostId, reply: &ReplyView) -> Node {
    let mut node = Element::new("div")
        .class("reply")
        .attr("data-reply-id", reply.id.as_str())
        .child(
            Element::new("div")
                .class("reply-header")
                .child(Element::new("strong").text(&reply.author))
                .child(Element::new("span").class("reply-time").text(&reply.posted_at)),
        )
        .child(Element::new("p").text(&reply.content));
    if reply.can_delete {
        node = node.child(
            Element::new("button")
                .class("delete-post-btn delete-reply-btn")
                .attr("data-action", "delete-reply")
                .attr("data-post-id", post_id.as_str())
                .attr("data-reply-id", reply.id.as_str())
                .text(DELETE_LABEL),
        );
    }
    node.into()
}

fn reply_box_node(post_id: &PostId, reply_box: &ReplyBox) -> Element {
    match reply_box {
        ReplyBox::Input { input_id } => Element::new("div")
            .class("reply-input-section")
            .child(
                Element::new("input")
                    .attr("type", "text")
                    .attr("id", input_id)
                    .attr("placeholder", "Add a reply...")
                    .class("reply-input"),
            )
            .child(
                Element::new("button")
                    .class("submit-reply-btn")
                    .attr("data-action", "submit-reply")
                    .attr("data-post-id", post_id.as_str())
                    .attr("data-input-id", input_id)
                    .text("Reply"),
            ),
        ReplyBox::LoginPrompt { login_url } => Element::new("p")
            .class("login-prompt")
            .child(Element::new("a").attr("href", login_url).text("Login"))
            .text(" to reply"),
    }
}
