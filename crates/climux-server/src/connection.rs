//! Per-connection reader and writer tasks.
//!
//! Each peer gets one reader task (bytes in, lines out) and one writer task
//! (draining its outbox into the socket). The reader feeds a per-connection
//! line assembler, so a peer holding a partial line can never interleave
//! with another peer's input. All socket reads sit under the configured
//! idle timeout; tokio surfaces no would-block results, so every `Err` from
//! a read is a genuine connection fault.

use crate::state::ServerState;
use climux_core::{dispatch_line, LineAssembler, PeerId};
use climux_types::Target;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info};

/// Why a connection ended.
enum CloseReason {
    /// Orderly close (zero-length read).
    Closed,
    /// Read error other than end of stream.
    Fault,
    /// No bytes received within the idle bound.
    Idle,
    /// Server shutdown.
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Closed => write!(f, "closed by peer"),
            CloseReason::Fault => write!(f, "connection fault"),
            CloseReason::Idle => write!(f, "idle timeout"),
            CloseReason::Shutdown => write!(f, "server shutdown"),
        }
    }
}

/// Serve one registered peer until it disconnects or the server stops.
pub(crate) async fn serve(
    id: PeerId,
    socket: TcpStream,
    state: Arc<ServerState>,
    outbox: mpsc::Receiver<Vec<u8>>,
    shutdown: watch::Receiver<bool>,
) {
    let (read_half, write_half) = socket.into_split();
    let writer = tokio::spawn(write_loop(write_half, outbox));

    let reason = read_loop(id, read_half, &state, shutdown).await;

    // Removing the peer drops its outbox sender; the writer drains what is
    // queued and exits on the closed channel.
    if state.registry.remove(id) {
        info!(
            target: "climux::conn",
            peer = id,
            reason = %reason,
            remaining = state.registry.count(),
            "peer disconnected"
        );
    }
    let _ = writer.await;
}

async fn read_loop(
    id: PeerId,
    mut reader: OwnedReadHalf,
    state: &Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) -> CloseReason {
    let mut assembler = LineAssembler::new();
    let mut read_buf = [0u8; 256];
    let idle = Duration::from_secs(state.config.idle_timeout_secs);

    loop {
        let read = tokio::select! {
            _ = shutdown.changed() => return CloseReason::Shutdown,
            r = timeout(idle, reader.read(&mut read_buf)) => r,
        };

        match read {
            Err(_) => {
                debug!(target: "climux::conn", peer = id, "no traffic within idle bound");
                return CloseReason::Idle;
            }
            Ok(Ok(0)) => {
                if assembler.pending() > 0 {
                    debug!(
                        target: "climux::conn",
                        peer = id,
                        pending = assembler.pending(),
                        "discarding partial line on close"
                    );
                }
                return CloseReason::Closed;
            }
            Ok(Ok(n)) => {
                for &byte in &read_buf[..n] {
                    if let Some(line) = assembler.push(byte) {
                        if state.config.serial_echo && !line.is_empty() {
                            state.serial.write_bytes(line.as_bytes());
                            state.serial.write_bytes(b"\n");
                        }
                        dispatch_line(&state.interpreter, &state.router, &line, Target::Tcp).await;
                    }
                }
            }
            Ok(Err(e)) => {
                debug!(target: "climux::conn", peer = id, "read failed: {e}");
                return CloseReason::Fault;
            }
        }
    }
}

/// Drain the peer's outbox into the socket. Best effort: a failed write
/// ends the task and leaves cleanup to the read path.
async fn write_loop(mut writer: OwnedWriteHalf, mut outbox: mpsc::Receiver<Vec<u8>>) {
    while let Some(chunk) = outbox.recv().await {
        if writer.write_all(&chunk).await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}
