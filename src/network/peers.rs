use crate::error::{BlockchainError, Result};
use crate::network::Message;
use log::{info, warn};
use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::thread;
use std::time::Duration;

const TCP_WRITE_TIMEOUT: u64 = 5000;

/// Messages a peer may have queued before it is treated as stalled.
const OUTBOUND_QUEUE_LEN: usize = 256;

/// Outbound half of a connected peer.
pub trait Peer: Send + Sync {
    fn addr(&self) -> String;

    fn send(&self, message: &Message) -> Result<()>;
}

/// A peer reached over TCP. Messages are written as one JSON document per line.
///
/// `send` only enqueues. A dedicated writer thread owns the socket, so a peer
/// that stops reading stalls nobody but itself. Once a write fails the stream
/// is shut down and the peer evicted; nothing is ever written after a
/// partially sent message.
pub struct TcpPeer {
    addr: String,
    outbound: SyncSender<Message>,
    closed: Arc<AtomicBool>,
    stream: TcpStream,
}

impl TcpPeer {
    pub fn new(stream: &TcpStream, peers: &Arc<Peers>) -> Result<TcpPeer> {
        let addr = stream.peer_addr()?.to_string();
        let writer = stream.try_clone()?;
        writer
            .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT)))
            .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;

        let (outbound, queue) = mpsc::sync_channel(OUTBOUND_QUEUE_LEN);
        let closed = Arc::new(AtomicBool::new(false));
        let writer_addr = addr.clone();
        let writer_closed = Arc::clone(&closed);
        let registry = Arc::downgrade(peers);
        thread::spawn(move || write_loop(writer_addr, writer, queue, writer_closed, registry));

        Ok(TcpPeer {
            addr,
            outbound,
            closed,
            stream: stream.try_clone()?,
        })
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.stream.shutdown(Shutdown::Both) {
                warn!("failed to close connection to {}: {e}", self.addr);
            }
        }
    }
}

impl Peer for TcpPeer {
    fn addr(&self) -> String {
        self.addr.clone()
    }

    fn send(&self, message: &Message) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BlockchainError::Network(format!("{} is closed", self.addr)));
        }
        match self.outbound.try_send(message.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.close();
                Err(BlockchainError::Network(format!(
                    "{} stopped reading, outbound queue is full",
                    self.addr
                )))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(BlockchainError::Network(format!("{} is closed", self.addr)))
            }
        }
    }
}

/// Drain `queue` onto the socket until the peer goes away or a write fails.
fn write_loop(
    addr: String,
    mut stream: TcpStream,
    queue: Receiver<Message>,
    closed: Arc<AtomicBool>,
    peers: Weak<Peers>,
) {
    for message in queue {
        if closed.load(Ordering::SeqCst) {
            break;
        }
        info!("write {message} to {addr}");
        if let Err(e) = write_message(&mut stream, &message) {
            warn!("Failed to write to {addr}: {e}");
            if !closed.swap(true, Ordering::SeqCst) {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    warn!("failed to close connection to {addr}: {e}");
                }
            }
            if let Some(peers) = peers.upgrade() {
                peers.evict_peer(&addr);
            }
            break;
        }
    }
}

/// The whole document is encoded before the first byte hits the socket.
fn write_message(stream: &mut TcpStream, message: &Message) -> Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    stream.write_all(&line)?;
    stream.flush()?;
    Ok(())
}

/// The set of currently connected peers.
///
/// Broadcasts iterate a snapshot, so connects and disconnects never wait on
/// a slow write.
#[derive(Default)]
pub struct Peers {
    inner: RwLock<Vec<Arc<dyn Peer>>>,
}

impl Peers {
    pub fn new() -> Peers {
        Peers {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add_peer(&self, peer: Arc<dyn Peer>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let addr = peer.addr();
        if !inner.iter().any(|x| x.addr() == addr) {
            inner.push(peer);
        }
    }

    pub fn evict_peer(&self, addr: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(idx) = inner.iter().position(|x| x.addr() == addr) {
            inner.remove(idx);
        }
    }

    pub fn get_peers(&self) -> Vec<Arc<dyn Peer>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    pub fn get_addrs(&self) -> Vec<String> {
        self.get_peers().iter().map(|peer| peer.addr()).collect()
    }

    pub fn peer_is_known(&self, addr: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|x| x.addr() == addr)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand `message` to every connected peer; returns how many accepted it.
    ///
    /// A peer that refuses the message is evicted.
    pub fn broadcast(&self, message: &Message) -> usize {
        let mut delivered = 0;
        for peer in self.get_peers() {
            match peer.send(message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Failed to write to {}: {e}", peer.addr());
                    self.evict_peer(&peer.addr());
                }
            }
        }
        delivered
    }
}
