//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Read and post to a rant board from the terminal.
#[derive(Debug, Parser)]
#[command(name = "rant-board", version)]
pub struct Cli {
    /// Extra configuration file (overrides RANT_CONFIG).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// API origin, e.g. https://rants.example.com
    #[arg(long, global = true, value_name = "URL")]
    pub api_base: Option<String>,

    /// Session file holding the current-user record.
    #[arg(long, global = true, value_name = "FILE")]
    pub session: Option<PathBuf>,

    /// Write the rendered post list here. `render` defaults to stdout;
    /// other commands discard the refreshed list unless this is set.
    #[arg(long, short, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Wrap the post list in a full HTML page.
    #[arg(long, global = true)]
    pub page: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all posts and render them.
    Render,

    /// Create a post.
    Post {
        content: String,
        /// Image to attach, sent as a base64 data URL.
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },

    /// Reply to a post.
    Reply { post_id: String, content: String },

    /// Delete a post (admin sessions only).
    DeletePost {
        post_id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Delete a reply (admin sessions only).
    DeleteReply {
        post_id: String,
        reply_id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Show who the session file says you are.
    Whoami,
}

impl Command {
    pub fn assume_yes(&self) -> bool {
        matches!(
            self,
            Command::DeletePost { yes: true, .. } | Command::DeleteReply { yes: true, .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rant-board",
            "render",
            "--api-base",
            "http://localhost:4000",
            "--page",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Render));
        assert_eq!(cli.api_base.as_deref(), Some("http://localhost:4000"));
        assert!(cli.page);
    }

    #[test]
    fn parses_delete_reply_with_confirmation_skip() {
        let cli = Cli::try_parse_from(["rant-board", "delete-reply", "4", "9", "--yes"]).unwrap();
        assert!(cli.command.assume_yes());
        let Command::DeleteReply { post_id, reply_id, .. } = cli.command else {
            panic!("expected delete-reply");
        };
        assert_eq!((post_id.as_str(), reply_id.as_str()), ("4", "9"));
    }

    #[test]
    fn post_accepts_image_path() {
        let cli = Cli::try_parse_from(["rant-board", "post", "hello", "--image", "cat.png"]).unwrap();
        let Command::Post { content, image } = cli.command else {
            panic!("expected post");
        };
        assert_eq!(content, "hello");
        assert_eq!(image, Some(PathBuf::from("cat.png")));
    }
}
