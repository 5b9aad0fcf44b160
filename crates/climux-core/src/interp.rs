//! The shared command interpreter seam and its mutual-exclusion gate.
//!
//! The interpreter itself is an opaque collaborator; climux only needs its
//! two entry points. Commands can originate from any TCP peer or from the
//! local serial console, so every dispatch goes through one async mutex —
//! the single true concurrency hazard in the design.

use crate::router::OutputRouter;
use climux_types::{JsonCommand, Target};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// The line-oriented command interpreter consumed by the server.
pub trait Interpreter: Send {
    /// Execute a free-form command line.
    fn execute_line(&mut self, line: &str, target: Target, out: &OutputRouter);

    /// Execute a structured (JSON) command.
    fn execute_json(&mut self, cmd: &JsonCommand, target: Target, out: &OutputRouter);
}

/// Gate serializing all command execution regardless of origin.
pub type SharedInterpreter = Arc<Mutex<Box<dyn Interpreter>>>;

/// Dispatch one assembled line through the interpreter gate.
///
/// Empty lines are ignored without touching the gate. A line starting with
/// `{` is parsed as a [`JsonCommand`]; parse failure is reported through the
/// router and does not reach the interpreter. The gate is held for exactly
/// the duration of one dispatch and released on every exit path.
pub async fn dispatch_line(
    gate: &SharedInterpreter,
    router: &OutputRouter,
    line: &str,
    target: Target,
) {
    if line.is_empty() {
        return;
    }

    debug!(target: "climux::cli", %target, line, "dispatching command line");

    if line.starts_with('{') {
        match JsonCommand::parse(line) {
            Ok(cmd) => {
                let mut interp = gate.lock().await;
                interp.execute_json(&cmd, target, router);
            }
            Err(e) => {
                warn!(target: "climux::cli", %target, "malformed structured command: {e}");
                router.write_line("error: malformed json command");
            }
        }
    } else {
        let mut interp = gate.lock().await;
        interp.execute_line(line, target, router);
    }
}
