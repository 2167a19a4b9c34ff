use crate::error::{BlockchainError, Result};
use crate::network::{Message, Peer, SyncEngine, TcpPeer};
use log::{error, info, warn};
use serde_json::Deserializer;
use std::io::BufReader;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// P2P server: accepts and dials peer connections and runs one reader
/// thread per connection.
#[derive(Clone)]
pub struct Server {
    engine: Arc<SyncEngine>,
}

impl Server {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Bind `addr` and serve peers on a background thread.
    pub fn run(&self, addr: &str) -> Result<JoinHandle<()>> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        info!("listening p2p on {addr}");
        let server = self.clone();
        Ok(thread::spawn(move || server.serve(listener)))
    }

    /// Accept connections from an already bound listener
    pub fn serve(&self, listener: TcpListener) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_connection(stream),
                Err(e) => error!("Error accepting connection: {e}"),
            }
        }
    }

    /// Dial `addr` once and start the protocol on the new connection.
    pub fn connect_to_peer(&self, addr: &str) -> Result<()> {
        info!("connect to {addr}");
        let stream = TcpStream::connect(addr)
            .map_err(|e| BlockchainError::Dial(format!("Failed to dial {addr}: {e}")))?;
        self.spawn_connection(stream);
        Ok(())
    }

    /// Dial every address, logging the ones that fail
    pub fn connect_to_peers(&self, addrs: &[String]) {
        for addr in addrs {
            if let Err(e) = self.connect_to_peer(addr) {
                error!("Failed to connect to peer {addr}: {e}");
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream) {
        let engine = Arc::clone(&self.engine);
        thread::spawn(move || {
            if let Err(e) = Self::handle_connection(&engine, stream) {
                warn!("connection ended with error: {e}");
            }
        });
    }

    fn handle_connection(engine: &SyncEngine, stream: TcpStream) -> Result<()> {
        let peer: Arc<dyn Peer> = Arc::new(TcpPeer::new(&stream, engine.node().peers())?);

        let result = match engine.on_connected(Arc::clone(&peer)) {
            Ok(()) => Self::listen(engine, peer.as_ref(), &stream),
            Err(e) => Err(e),
        };

        engine.on_disconnected(peer.as_ref());
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            warn!("failed to close connection: {e}");
        }
        result
    }

    /// Read messages until the peer hangs up or sends something undecodable.
    fn listen(engine: &SyncEngine, peer: &dyn Peer, stream: &TcpStream) -> Result<()> {
        let reader = BufReader::new(stream);
        let messages = Deserializer::from_reader(reader).into_iter::<Message>();

        for message in messages {
            let message = message.map_err(|e| {
                BlockchainError::Decode(format!("Failed to parse message from {}: {e}", peer.addr()))
            })?;

            info!("received message from {}: {message}", peer.addr());

            if let Err(e) = engine.handle_message(peer, message) {
                error!("Error processing message from {}: {e}", peer.addr());
            }
        }

        Ok(())
    }
}
