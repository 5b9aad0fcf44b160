//! Structured command envelope.
//!
//! A line that starts with `{` is parsed into this envelope and dispatched
//! through the interpreter's structured entry point; everything else is
//! treated as free-form command text.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// A structured (JSON) command received on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCommand {
    /// Command name (e.g., "echo", "status").
    pub cmd: String,
    /// Optional free-shape arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
}

impl JsonCommand {
    /// Parse a complete line as a structured command.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Summary of one connected peer, as reported by administrative commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: u64,
    pub addr: SocketAddr,
}
