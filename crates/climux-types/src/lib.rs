//! Shared types for the climux command server.

mod command;
mod target;

pub use command::*;
pub use target::*;
