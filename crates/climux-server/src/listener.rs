//! Listening socket and accept loop.

use crate::connection;
use crate::state::ServerState;
use climux_core::{ClimuxError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Depth of each peer's outbound byte-chunk channel.
pub(crate) const OUTBOX_DEPTH: usize = 64;

/// Handle to a running command server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to. Tests bind port 0 and read the
    /// real port from here.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receiver observed by every server task; flips to `true` on shutdown.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Stop the accept loop and tear down every live connection.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// The TCP front end of the shared interpreter.
pub struct CliServer;

impl CliServer {
    /// Bind the listener and spawn the accept loop.
    ///
    /// Bind failure is fatal: the error is returned, nothing is spawned,
    /// and any partially created resources are dropped.
    pub async fn start(state: Arc<ServerState>) -> Result<ServerHandle> {
        if !state.config.enabled {
            return Err(ClimuxError::Disabled);
        }

        let addr = format!("{}:{}", state.config.host, state.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(
            target: "climux::startup",
            %local_addr,
            max = state.registry.max(),
            "command server listening"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(accept_loop(listener, state, shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            task,
        })
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<ServerState>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            res = listener.accept() => match res {
                Ok((socket, addr)) => handle_accept(socket, addr, &state, &shutdown),
                Err(e) => {
                    // Transient accept failure; the loop keeps serving.
                    warn!(target: "climux::conn", "accept failed: {e}");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            _ = shutdown.changed() => {
                info!(target: "climux::startup", "accept loop stopping");
                break;
            }
        }
    }
}

fn handle_accept(
    socket: TcpStream,
    addr: SocketAddr,
    state: &Arc<ServerState>,
    shutdown: &watch::Receiver<bool>,
) {
    let (tx, rx) = mpsc::channel(OUTBOX_DEPTH);
    let id = match state.registry.add(addr, tx) {
        Ok(id) => id,
        Err(e) => {
            // Refuse by closing immediately. Dropping the socket sends
            // FIN; the client observes an instant EOF.
            warn!(target: "climux::conn", %addr, "connection refused: {e}");
            return;
        }
    };

    info!(
        target: "climux::conn",
        %addr,
        peer = id,
        count = state.registry.count(),
        "peer connected"
    );
    tokio::spawn(connection::serve(
        id,
        socket,
        state.clone(),
        rx,
        shutdown.clone(),
    ));
}
