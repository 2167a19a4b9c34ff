use crate::control::{Request, Response};
use crate::error::{BlockchainError, Result};
use crate::network::{Node, Server};
use log::{error, info, warn};
use serde_json::Deserializer;
use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Serves collaborator requests (list blocks, mine, list peers, add peer)
/// as JSON lines over TCP.
#[derive(Clone)]
pub struct ControlServer {
    node: Arc<Node>,
    p2p: Server,
}

impl ControlServer {
    pub fn new(node: Arc<Node>, p2p: Server) -> Self {
        Self { node, p2p }
    }

    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BlockchainError::Network(format!("Failed to bind to {addr}: {e}")))?;
        info!("listening control on {addr}");
        self.serve(listener);
        Ok(())
    }

    pub fn serve(&self, listener: TcpListener) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let server = self.clone();
                    thread::spawn(move || {
                        if let Err(e) = server.handle_client(stream) {
                            error!("Error handling control client: {e}");
                        }
                    });
                }
                Err(e) => error!("Error accepting connection: {e}"),
            }
        }
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Blocks => Response::Blocks(self.node.blocks()),
            Request::Mine { data } => match self.node.mine_block(&data) {
                Ok(block) => Response::Mined(block),
                Err(e) => {
                    error!("failed to add block: {e}");
                    e.into()
                }
            },
            Request::Peers => Response::Peers(self.node.peers().get_addrs()),
            Request::AddPeer { addr } => match self.p2p.connect_to_peer(&addr) {
                Ok(()) => Response::PeerAdded(addr),
                Err(e) => {
                    error!("failed to connect to peer: {e}");
                    e.into()
                }
            },
        }
    }

    fn handle_client(&self, stream: TcpStream) -> Result<()> {
        let mut writer = stream.try_clone()?;
        let requests = Deserializer::from_reader(BufReader::new(&stream)).into_iter::<Request>();

        for request in requests {
            let response = match request {
                Ok(request) => {
                    info!("control request: {request:?}");
                    self.handle(request)
                }
                Err(e) => {
                    // a malformed request leaves the stream unusable
                    write_response(&mut writer, &Response::request_error(e.to_string()))?;
                    break;
                }
            };
            write_response(&mut writer, &response)?;
        }

        if let Err(e) = stream.shutdown(Shutdown::Both) {
            warn!("failed to close control connection: {e}");
        }
        Ok(())
    }
}

fn write_response(writer: &mut TcpStream, response: &Response) -> Result<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Send one request to a running node's control address and wait for the answer.
pub fn send_request(addr: &str, request: &Request) -> Result<Response> {
    let mut stream = TcpStream::connect(addr)
        .map_err(|e| BlockchainError::Dial(format!("Failed to connect to {addr}: {e}")))?;

    serde_json::to_writer(&mut stream, request)?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    stream.shutdown(Shutdown::Write)?;

    Deserializer::from_reader(BufReader::new(&stream))
        .into_iter::<Response>()
        .next()
        .ok_or_else(|| BlockchainError::Network(format!("{addr} closed without answering")))?
        .map_err(|e| BlockchainError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ErrorKind;
    use crate::network::{Peers, SyncEngine};

    fn create_control() -> ControlServer {
        let node = Arc::new(Node::new(Arc::new(Peers::new())));
        let engine = Arc::new(SyncEngine::new(Arc::clone(&node)));
        ControlServer::new(node, Server::new(engine))
    }

    #[test]
    fn test_mine_then_list_blocks() {
        let control = create_control();

        let mined = match control.handle(Request::Mine {
            data: "first".to_string(),
        }) {
            Response::Mined(block) => block,
            other => panic!("unexpected response: {other:?}"),
        };
        assert_eq!(mined.get_index(), 1);

        match control.handle(Request::Blocks) {
            Response::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert_eq!(blocks[1], mined);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_add_unreachable_peer_reports_connectivity() {
        let control = create_control();
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .to_string();

        match control.handle(Request::AddPeer { addr }) {
            Response::Error { kind, .. } => assert_eq!(kind, ErrorKind::Connectivity),
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(control.handle(Request::Peers), Response::Peers(vec![]));
    }

    #[test]
    fn test_round_trip_over_tcp() {
        let control = create_control();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let serving = control.clone();
        thread::spawn(move || serving.serve(listener));

        let response = send_request(
            &addr,
            &Request::Mine {
                data: "over the wire".to_string(),
            },
        )
        .unwrap();
        assert!(matches!(response, Response::Mined(_)));

        match send_request(&addr, &Request::Blocks).unwrap() {
            Response::Blocks(blocks) => assert_eq!(blocks.len(), 2),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_request_gets_error_and_close() {
        let control = create_control();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let serving = control.clone();
        thread::spawn(move || serving.serve(listener));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"{\"command\":\"explode\"}\n").unwrap();

        let mut replies =
            Deserializer::from_reader(BufReader::new(&stream)).into_iter::<Response>();
        match replies.next().unwrap().unwrap() {
            Response::Error { kind, .. } => assert_eq!(kind, ErrorKind::Request),
            other => panic!("unexpected response: {other:?}"),
        }
        assert!(replies.next().is_none());
    }
}
