//! Local serial console.
//!
//! On the device this is the UART path; here stdin/stdout stand in for it.
//! Console input goes through the same interpreter gate as TCP input, which
//! is exactly the cross-origin contention the gate exists to serialize.

use crate::state::ServerState;
use climux_core::{dispatch_line, SerialSink};
use climux_types::Target;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

/// Serial sink backed by process stdout.
pub struct StdoutSerial;

impl SerialSink for StdoutSerial {
    fn write_byte(&self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    fn write_bytes(&self, bytes: &[u8]) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }
}

/// Read command lines from stdin and dispatch them with `Target::Serial`
/// until EOF or shutdown.
pub async fn run_console(state: Arc<ServerState>, mut shutdown: watch::Receiver<bool>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    info!(target: "climux::serial", "local console ready");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    dispatch_line(&state.interpreter, &state.router, line.trim_end(), Target::Serial)
                        .await;
                }
                Ok(None) => {
                    info!(target: "climux::serial", "console input closed");
                    break;
                }
                Err(e) => {
                    warn!(target: "climux::serial", "console read failed: {e}");
                    break;
                }
            }
        }
    }
}
