//! Built-in demo interpreter.
//!
//! The real device wires its own command interpreter into the gate; the
//! binary needs something to run, so this minimal shell answers a handful
//! of administrative commands. Replace it by passing any other
//! [`Interpreter`] into `ServerState::new`.

use climux_core::{ConnRegistry, Interpreter, OutputRouter};
use climux_types::{JsonCommand, Target};
use std::sync::Arc;
use std::time::Instant;

pub struct ShellInterpreter {
    registry: Arc<ConnRegistry>,
    started_at: Instant,
}

impl ShellInterpreter {
    pub fn new(registry: Arc<ConnRegistry>) -> Self {
        Self {
            registry,
            started_at: Instant::now(),
        }
    }

    fn run(&self, cmd: &str, args: Option<&str>, out: &OutputRouter) {
        match cmd {
            "help" => {
                out.write_line("commands: help, echo <text>, uptime, peers");
            }
            "echo" => {
                out.write_line(args.unwrap_or(""));
            }
            "uptime" => {
                out.write_line(&format!("{}s", self.started_at.elapsed().as_secs()));
            }
            "peers" => {
                let peers = self.registry.peers();
                out.write_line(&format!("{} peer(s) connected", peers.len()));
                for p in peers {
                    out.write_line(&format!("  #{} {}", p.id, p.addr));
                }
            }
            _ => {
                out.write_line(&format!("unknown command: {cmd}"));
            }
        }
    }
}

impl Interpreter for ShellInterpreter {
    fn execute_line(&mut self, line: &str, _target: Target, out: &OutputRouter) {
        let mut parts = line.splitn(2, char::is_whitespace);
        let cmd = parts.next().unwrap_or("");
        let args = parts.next().map(str::trim).filter(|s| !s.is_empty());
        self.run(cmd, args, out);
    }

    fn execute_json(&mut self, cmd: &JsonCommand, _target: Target, out: &OutputRouter) {
        let args = cmd.args.as_ref().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        self.run(&cmd.cmd, args.as_deref(), out);
    }
}
