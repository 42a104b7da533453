//! # auth-adapters
//!
//! Where the current-user record comes from. The login flow itself lives
//! elsewhere; this crate only reads what it left behind.

pub mod file_store;

pub use file_store::{FileSessionStore, SessionStoreError, DEFAULT_SESSION_KEY};
