//! # Session Fresher Library
//!
//! Keeps one session token fresh for many concurrent readers: refreshes are
//! deduplicated (single-flight), throttled by a cooldown window and driven by a
//! background renewer.
//!
//! Modules:
//! - `session` — published state, refresh coordinator, renewer and reader
//! - `sources` — token sources (simulated, HTTP)
//! - `config` — YAML service configuration and validation
//! - `server` — status, session and metrics HTTP routes

pub mod config;
pub mod session;
pub mod sources;
pub mod resilience;
pub mod tests;
pub mod observability;
pub mod server;
pub mod helpers;
pub mod utils;


pub use crate::config::sources::*;
pub use crate::session::{SessionReader, TokenId};
