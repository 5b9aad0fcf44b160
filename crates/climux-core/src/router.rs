//! Output routing between the serial sink and TCP peers.

use crate::registry::ConnRegistry;
use std::sync::Arc;
use tracing::trace;

/// Where interpreter output currently goes.
///
/// Serial output is never suppressed; `BroadcastToPeers` adds fan-out to
/// every live peer on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectState {
    SerialOnly,
    BroadcastToPeers,
}

/// The always-on local output leg.
///
/// On the device this is the UART; the server binary writes to stdout and
/// tests record into a buffer.
pub trait SerialSink: Send + Sync {
    fn write_byte(&self, byte: u8);

    fn write_bytes(&self, bytes: &[u8]) {
        for &b in bytes {
            self.write_byte(b);
        }
    }
}

/// Single write entry point for all interpreter output.
///
/// Every write lands on the serial sink; when the registry holds live peers
/// the same bytes are also handed to each peer's outbox, best effort. A
/// full or closed outbox on one peer never blocks the others and never by
/// itself tears the peer down; the read path notices dead peers.
pub struct OutputRouter {
    serial: Arc<dyn SerialSink>,
    registry: Arc<ConnRegistry>,
}

impl OutputRouter {
    pub fn new(serial: Arc<dyn SerialSink>, registry: Arc<ConnRegistry>) -> Self {
        Self { serial, registry }
    }

    pub fn state(&self) -> RedirectState {
        self.registry.redirect_state()
    }

    pub fn write_byte(&self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    pub fn write_bytes(&self, bytes: &[u8]) {
        if self.registry.redirect_state() == RedirectState::BroadcastToPeers {
            self.registry.for_each_sender(|id, tx| {
                if tx.try_send(bytes.to_vec()).is_err() {
                    trace!(target: "climux::io", peer = id, "peer outbox unavailable, byte dropped");
                }
            });
        }
        self.serial.write_bytes(bytes);
    }

    pub fn write_str(&self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_line(&self, s: &str) {
        self.write_str(s);
        self.write_bytes(b"\n");
    }
}
