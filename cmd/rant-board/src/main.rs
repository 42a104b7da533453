//! # rant-board
//!
//! Assembles the board client from configuration and runs one command.

mod cli;
mod telemetry;
mod terminal;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api_adapters::RestBoardApi;
use auth_adapters::FileSessionStore;
use clap::Parser;
use configs::{Settings, TimeDisplaySetting};
use domains::{ImageFile, PostDraft, PostId, ReplyDraft, ReplyId, Session, SessionStore};
use services::{BoardClient, BoardOptions, MutationOutcome, TimeDisplay, ViewOptions, ViewState};
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::terminal::{OutputContainer, Target, TerminalInteraction};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = tracing::dispatcher::with_default(&telemetry::bootstrap(), || load_settings(&cli))?;
    telemetry::init(&settings.logging)?;

    let store = FileSessionStore::with_key(&settings.session.path, &settings.session.key);
    let session = store.session();
    debug!(
        path = %store.path().display(),
        logged_in = session.is_logged_in(),
        admin = session.is_admin(),
        "resolved session"
    );

    if let Command::Whoami = cli.command {
        print_session(&session);
        return Ok(ExitCode::SUCCESS);
    }

    let api = RestBoardApi::with_timeout(
        &settings.api.base_url,
        settings.api.request_timeout_secs.map(Duration::from_secs),
    )?;
    info!(base = %api.base_url(), "using posts API");

    let target = match (&cli.output, &cli.command) {
        (Some(path), _) => Target::File(path.clone()),
        (None, Command::Render) => Target::Stdout,
        (None, _) => Target::Discard,
    };
    let container = OutputContainer::new(target, cli.page.then(|| settings.board.title.clone()));

    let client = BoardClient::new(
        Arc::new(api),
        Arc::new(TerminalInteraction::new(cli.command.assume_yes())),
        Arc::new(container),
        board_options(&settings),
    );

    let code = match cli.command {
        Command::Render => match client.load_posts(&session).await {
            ViewState::Failed(_) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        },
        Command::Post { content, image } => {
            let mut draft = PostDraft::new(content);
            if let Some(path) = image {
                draft = draft.with_image(read_image(&path).await?);
            }
            exit_code(client.submit_post(&session, &mut draft).await)
        }
        Command::Reply { post_id, content } => {
            let mut draft = ReplyDraft::new(PostId::new(post_id), content);
            exit_code(client.submit_reply(&session, &mut draft).await)
        }
        Command::DeletePost { post_id, .. } => {
            exit_code(client.delete_post(&session, &PostId::new(post_id)).await)
        }
        Command::DeleteReply {
            post_id, reply_id, ..
        } => exit_code(
            client
                .delete_reply(&session, &PostId::new(post_id), &ReplyId::new(reply_id))
                .await,
        ),
        Command::Whoami => ExitCode::SUCCESS,
    };
    Ok(code)
}

/// Configuration layers plus the command-line overrides.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(base) = &cli.api_base {
        settings.override_api_base(base.clone())?;
    }
    if let Some(path) = &cli.session {
        settings.session.path = path.clone();
    }
    Ok(settings)
}

fn board_options(settings: &Settings) -> BoardOptions {
    BoardOptions {
        require_login_to_post: settings.board.require_login_to_post,
        view: ViewOptions {
            login_url: settings.board.login_url.clone(),
            time_display: match settings.board.time_display {
                TimeDisplaySetting::Local => TimeDisplay::Local,
                TimeDisplaySetting::Utc => TimeDisplay::Utc,
            },
        },
    }
}

async fn read_image(path: &Path) -> anyhow::Result<ImageFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading image {}", path.display()))?;
    Ok(ImageFile {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type: None,
        bytes: bytes.into(),
    })
}

/// The user has already been alerted; only the status is left to report.
fn exit_code(result: domains::Result<MutationOutcome>) -> ExitCode {
    match result {
        Ok(MutationOutcome::Applied) => ExitCode::SUCCESS,
        Ok(MutationOutcome::Cancelled) => {
            eprintln!("Cancelled.");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

fn print_session(session: &Session) {
    match session.user() {
        None => println!("anonymous"),
        Some(_) => println!(
            "{}{}",
            session.author_name(),
            if session.is_admin() { " (admin)" } else { "" }
        ),
    }
}
