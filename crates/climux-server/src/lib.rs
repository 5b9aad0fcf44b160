//! Climux server library - TCP front end for a shared command interpreter.
//!
//! The connection handling lives here rather than in main.rs so the
//! integration tests can start real servers on ephemeral ports.

pub mod config;
pub mod connection;
pub mod listener;
pub mod logging;
pub mod serial;
pub mod shell;
pub mod state;
