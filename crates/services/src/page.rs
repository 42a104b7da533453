//! Standalone page shell around a rendered post list.

use askama::Template;

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardPage<'a> {
    pub title: &'a str,
    /// Output of the node renderer; already escaped.
    pub posts_html: &'a str,
}

pub fn render_page(title: &str, posts_html: &str) -> askama::Result<String> {
    BoardPage { title, posts_html }.render()
}
