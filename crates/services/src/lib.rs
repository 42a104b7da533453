//! rant-board/crates/services/src/lib.rs
//!
//! The board client and everything it needs to turn fetched posts into
//! markup: view model, node renderer, timestamp display, data URLs and the
//! standalone page shell.

pub mod client;
pub mod data_url;
pub mod format;
pub mod page;
pub mod render;
pub mod view;

pub use client::{messages, BoardClient, BoardOptions, MutationOutcome, ViewState};
pub use format::TimeDisplay;
pub use view::ViewOptions;
