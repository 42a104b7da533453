//! rant-board/crates/domains/src/lib.rs
//!
//! Domain models, session, errors and the port traits the board client
//! depends on. Nothing in here performs I/O.

pub mod errors;
pub mod models;
pub mod ports;
pub mod session;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use session::*;
