//! Core connection-multiplexing logic for the climux command server.
//!
//! Everything in this crate is socket-free: the line assembler, the
//! connection registry, the output router, and the interpreter gate are
//! exercised by the TCP server in `climux-server` but testable on their own.

mod error;
mod interp;
mod line;
mod registry;
mod router;

pub use error::ClimuxError;
pub use interp::{dispatch_line, Interpreter, SharedInterpreter};
pub use line::{LineAssembler, MAX_LINE_LEN};
pub use registry::{ConnRegistry, PeerId};
pub use router::{OutputRouter, RedirectState, SerialSink};

/// Result type for climux operations.
pub type Result<T> = std::result::Result<T, ClimuxError>;
