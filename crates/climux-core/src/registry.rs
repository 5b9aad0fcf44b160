//! Registry of live TCP peers.
//!
//! The registry owns the peer handles and the redirect state, and performs
//! the serial/broadcast transition exactly at the 0→1 and 1→0 occupancy
//! boundary crossings. Occupancy is reserved with an atomic counter so the
//! boundary claim holds even with accepts and teardowns racing on different
//! tasks.

use crate::router::RedirectState;
use crate::{ClimuxError, Result};
use climux_types::PeerInfo;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::info;

/// Identifier assigned to each peer for its lifetime.
pub type PeerId = u64;

struct PeerHandle {
    addr: SocketAddr,
    tx: mpsc::Sender<Vec<u8>>,
}

/// Set of currently connected peers, bounded by the configured maximum.
pub struct ConnRegistry {
    peers: DashMap<PeerId, PeerHandle>,
    count: AtomicUsize,
    next_id: AtomicU64,
    broadcast: AtomicBool,
    max: usize,
}

impl ConnRegistry {
    pub fn new(max: usize) -> Self {
        Self {
            peers: DashMap::new(),
            count: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            broadcast: AtomicBool::new(false),
            max,
        }
    }

    /// Register a peer. Fails with [`ClimuxError::AtCapacity`] when the
    /// registry is full; the caller closes the socket in that case.
    pub fn add(&self, addr: SocketAddr, tx: mpsc::Sender<Vec<u8>>) -> Result<PeerId> {
        let prev = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < self.max { Some(n + 1) } else { None }
            })
            .map_err(|_| ClimuxError::AtCapacity(self.max))?;

        if prev == 0 {
            self.broadcast.store(true, Ordering::SeqCst);
            info!(target: "climux::io", "io redirected to tcp");
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.peers.insert(id, PeerHandle { addr, tx });
        Ok(id)
    }

    /// Deregister a peer. Idempotent: removing an unknown id is a no-op and
    /// returns `false`.
    pub fn remove(&self, id: PeerId) -> bool {
        if self.peers.remove(&id).is_none() {
            return false;
        }
        let prev = self.count.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 {
            self.broadcast.store(false, Ordering::SeqCst);
            info!(target: "climux::io", "io restored to serial");
        }
        true
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn redirect_state(&self) -> RedirectState {
        if self.broadcast.load(Ordering::SeqCst) {
            RedirectState::BroadcastToPeers
        } else {
            RedirectState::SerialOnly
        }
    }

    pub fn peer_addr(&self, id: PeerId) -> Option<SocketAddr> {
        self.peers.get(&id).map(|p| p.addr)
    }

    /// Snapshot of connected peers, for administrative commands.
    pub fn peers(&self) -> Vec<PeerInfo> {
        let mut list: Vec<PeerInfo> = self
            .peers
            .iter()
            .map(|e| PeerInfo {
                id: *e.key(),
                addr: e.value().addr,
            })
            .collect();
        list.sort_by_key(|p| p.id);
        list
    }

    /// Visit the sender of every registered peer.
    pub fn for_each_sender(&self, mut f: impl FnMut(PeerId, &mpsc::Sender<Vec<u8>>)) {
        for entry in self.peers.iter() {
            f(*entry.key(), &entry.value().tx);
        }
    }
}
