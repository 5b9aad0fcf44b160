//! Channel targets for command dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the channel a command line arrived on.
///
/// The interpreter receives the target with every dispatch so it can
/// attribute responses before the output router fans them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The local serial console.
    Serial,
    /// A TCP peer of the command server.
    Tcp,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Serial => write!(f, "serial"),
            Target::Tcp => write!(f, "tcp"),
        }
    }
}
