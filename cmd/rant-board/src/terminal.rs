//! Terminal implementations of the interaction and container ports.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use domains::{Interaction, PostsContainer};
use services::page;
use tracing::{debug, error};

/// Alerts on stderr, confirmations on stdin.
pub struct TerminalInteraction {
    assume_yes: bool,
}

impl TerminalInteraction {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Interaction for TerminalInteraction {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                error!(error = %e, "could not read confirmation");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Clone)]
pub enum Target {
    Stdout,
    File(PathBuf),
    Discard,
}

/// Writes each render to its target, replacing what was there.
#[derive(Debug, Clone)]
pub struct OutputContainer {
    target: Target,
    /// When set, the fragment is wrapped in a full page with this title.
    page_title: Option<String>,
}

impl OutputContainer {
    pub fn new(target: Target, page_title: Option<String>) -> Self {
        Self { target, page_title }
    }

    fn document(&self, html: &str) -> String {
        match &self.page_title {
            None => html.to_string(),
            Some(title) => page::render_page(title, html).unwrap_or_else(|e| {
                error!(error = %e, "page template failed; writing bare fragment");
                html.to_string()
            }),
        }
    }
}

impl PostsContainer for OutputContainer {
    fn replace(&self, html: &str) {
        let document = self.document(html);
        match &self.target {
            Target::Stdout => println!("{document}"),
            Target::File(path) => {
                if let Err(e) = std::fs::write(path, document) {
                    error!(path = %path.display(), error = %e, "could not write rendered posts");
                }
            }
            Target::Discard => debug!(bytes = document.len(), "discarding refreshed post list"),
        }
    }
}
