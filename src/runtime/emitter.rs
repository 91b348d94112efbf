use std::io;
use std::net::TcpStream;

use tracing::{debug, trace, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};

use super::command::Command;

/// The seam between gesture logic and the wire. Implemented by the
/// WebSocket client in production and by a recording mock in tests.
pub trait Transport {
    fn is_ready(&self) -> bool;
    fn send(&mut self, payload: String) -> Result<(), io::Error>;
}

/// Serializes commands and hands them to the transport. When the
/// transport isn't ready the command is dropped on the floor: stale
/// positional deltas must never be replayed, so there is no queue and
/// no retry here.
pub struct CommandEmitter<T> {
    transport: T,
}

impl<T: Transport> CommandEmitter<T> {
    pub fn new(transport: T) -> Self {
        CommandEmitter { transport }
    }

    pub fn emit(&mut self, cmd: &Command) -> Result<(), io::Error> {
        if !self.transport.is_ready() {
            trace!(?cmd, "transport not ready, dropping command");
            return Ok(());
        }
        let payload = serde_json::to_string(cmd)?;
        self.transport.send(payload)
    }
}

/// WebSocket client for the remote cursor endpoint. A send failure
/// tears the socket down and the transport reports not-ready from then
/// on; reconnection is the operator's problem, not ours.
pub struct WsTransport {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
}

impl WsTransport {
    pub fn connect(url: &str) -> Result<Self, tungstenite::Error> {
        let (socket, response) = connect(url)?;
        debug!(status = ?response.status(), "websocket connected");
        Ok(WsTransport {
            socket: Some(socket),
        })
    }
}

impl Transport for WsTransport {
    fn is_ready(&self) -> bool {
        self.socket.is_some()
    }

    fn send(&mut self, payload: String) -> Result<(), io::Error> {
        let Some(socket) = self.socket.as_mut() else {
            return Ok(());
        };

        match socket.send(Message::text(payload)) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("websocket send failed, closing channel: {err}");
                self.socket = None;
                Err(to_io(err))
            }
        }
    }
}

fn to_io(err: tungstenite::Error) -> io::Error {
    match err {
        tungstenite::Error::Io(ioe) => ioe,
        other => io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockTransport {
        ready: bool,
        sent: Vec<String>,
    }

    impl Transport for MockTransport {
        fn is_ready(&self) -> bool {
            self.ready
        }
        fn send(&mut self, payload: String) -> Result<(), io::Error> {
            self.sent.push(payload);
            Ok(())
        }
    }

    #[test]
    fn ready_transport_gets_serialized_commands() {
        let mut emitter = CommandEmitter::new(MockTransport {
            ready: true,
            sent: Vec::new(),
        });

        emitter.emit(&Command::Move { dx: 1.0, dy: 2.0 }).unwrap();
        emitter.emit(&Command::Press).unwrap();

        assert_eq!(
            emitter.transport.sent,
            vec![
                r#"{"type":"move","dx":1.0,"dy":2.0}"#.to_string(),
                r#"{"type":"press"}"#.to_string(),
            ]
        );
    }

    #[test]
    fn not_ready_transport_drops_silently() {
        let mut emitter = CommandEmitter::new(MockTransport::default());

        // drop is not an error, per the degrade-by-omission contract
        emitter.emit(&Command::Down).unwrap();
        assert!(emitter.transport.sent.is_empty());
    }
}
