//! # api-adapters
//!
//! Outbound adapters for the posts API.

pub mod rest;

pub use rest::{RestBoardApi, DEFAULT_API_BASE};
