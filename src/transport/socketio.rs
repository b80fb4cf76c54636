// ABOUTME: Socket.IO client over tokio-tungstenite: handshake, heartbeat, emits, and event pump.
// ABOUTME: Each connection runs in its own task and reports events through an EventSink.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::frame::{
    ENGINE_PONG, EnginePacket, Handshake, SOCKET_CONNECT, SOCKET_DISCONNECT, SocketPacket,
    encode_event,
};
use super::{Connection, Connector, EventSink, TransportError, TransportEvent};
use crate::chat::events::{ClientEvent, EventDecodeError, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens Socket.IO connections over a websocket transport.
#[derive(Debug, Clone)]
pub struct SocketIoConnector {
    connect_timeout: Duration,
}

impl SocketIoConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for SocketIoConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Connector for SocketIoConnector {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Box<dyn Connection> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();
        info!(endpoint, generation = sink.generation(), "opening socket connection");
        let task = tokio::spawn(run_connection(
            endpoint.to_string(),
            sink,
            cmd_rx,
            close_rx,
            self.connect_timeout,
        ));
        Box::new(SocketIoConnection {
            cmd_tx,
            close_tx: Some(close_tx),
            task: Some(task),
        })
    }
}

/// Handle to a running connection task.
struct SocketIoConnection {
    cmd_tx: mpsc::UnboundedSender<ClientEvent>,
    close_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Connection for SocketIoConnection {
    fn emit(&self, event: ClientEvent) -> Result<(), TransportError> {
        if self.close_tx.is_none() {
            return Err(TransportError::Closed);
        }
        self.cmd_tx.send(event).map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            debug!("closing socket connection");
            let _ = tx.send(());
        }
    }

    fn take_task(&mut self) -> Option<JoinHandle<()>> {
        self.task.take()
    }
}

impl Drop for SocketIoConnection {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_connection(
    endpoint: String,
    sink: EventSink,
    cmd_rx: mpsc::UnboundedReceiver<ClientEvent>,
    mut close_rx: oneshot::Receiver<()>,
    connect_timeout: Duration,
) {
    let result = tokio::select! {
        res = tokio::time::timeout(connect_timeout, handshake(&endpoint)) => {
            res.unwrap_or(Err(TransportError::Timeout("socket handshake")))
        }
        _ = &mut close_rx => {
            debug!("connection closed before handshake completed");
            return;
        }
    };

    let (ws, handshake) = match result {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "socket connect failed");
            sink.send(TransportEvent::ConnectFailed(e.to_string())).await;
            return;
        }
    };

    info!(sid = %handshake.sid, "socket connected");
    if !sink.send(TransportEvent::Connected).await {
        return;
    }

    if let Some(reason) = pump(ws, &handshake, &sink, cmd_rx, close_rx).await {
        info!(%reason, "socket disconnected");
        sink.send(TransportEvent::Disconnected(reason)).await;
    }
}

/// Open the websocket and complete the Engine.IO open + Socket.IO namespace connect.
async fn handshake(endpoint: &str) -> Result<(WsStream, Handshake), TransportError> {
    let (mut ws, _) = connect_async(endpoint)
        .await
        .map_err(|e| TransportError::WebSocket(e.to_string()))?;

    let mut open: Option<Handshake> = None;
    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| TransportError::WebSocket(e.to_string()))?;
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => return Err(TransportError::Closed),
            _ => continue,
        };
        let packet =
            EnginePacket::decode(&text).map_err(|e| TransportError::Protocol(e.to_string()))?;
        match packet {
            EnginePacket::Open(hs) => {
                debug!(sid = %hs.sid, ping_interval = hs.ping_interval, "engine.io open");
                send_text(&mut ws, SOCKET_CONNECT).await?;
                open = Some(hs);
            }
            EnginePacket::Ping => send_text(&mut ws, ENGINE_PONG).await?,
            EnginePacket::Message(body) => {
                let Some(hs) = open.as_ref() else { continue };
                match SocketPacket::decode(&body) {
                    Ok(SocketPacket::Connect(_)) => return Ok((ws, hs.clone())),
                    Ok(SocketPacket::ConnectError(message)) => {
                        return Err(TransportError::Rejected(message));
                    }
                    Ok(_) => {}
                    Err(e) => return Err(TransportError::Protocol(e.to_string())),
                }
            }
            EnginePacket::Close => return Err(TransportError::Closed),
            _ => {}
        }
    }
    Err(TransportError::Closed)
}

async fn send_text(ws: &mut WsStream, frame: &str) -> Result<(), TransportError> {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .map_err(|e| TransportError::WebSocket(e.to_string()))
}

/// Run the connected socket until it closes. Returns the disconnect reason,
/// or `None` when the close was requested locally.
async fn pump(
    ws: WsStream,
    handshake: &Handshake,
    sink: &EventSink,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientEvent>,
    mut close_rx: oneshot::Receiver<()>,
) -> Option<String> {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let idle = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
    let liveness = tokio::time::sleep(idle);
    tokio::pin!(liveness);

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = ws_tx.send(Message::Text(SOCKET_DISCONNECT.to_string().into())).await;
                let _ = ws_tx.close().await;
                return None;
            }
            cmd = cmd_rx.recv() => {
                let Some(event) = cmd else {
                    let _ = ws_tx.close().await;
                    return None;
                };
                let frame = encode_event(event.name(), &event.payload());
                debug!(event = event.name(), "emit");
                if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                    return Some(format!("send failed: {e}"));
                }
            }
            _ = &mut liveness => {
                return Some("ping timeout".to_string());
            }
            msg = ws_rx.next() => {
                liveness.as_mut().reset(Instant::now() + idle);
                let text = match msg {
                    None => return Some("connection closed by server".to_string()),
                    Some(Err(e)) => return Some(e.to_string()),
                    Some(Ok(Message::Close(_))) => {
                        return Some("connection closed by server".to_string());
                    }
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(_)) => continue,
                };
                match interpret(&text) {
                    FrameAction::Ignore => {}
                    FrameAction::Reply(frame) => {
                        if let Err(e) = ws_tx.send(Message::Text(frame.to_string().into())).await {
                            return Some(format!("send failed: {e}"));
                        }
                    }
                    FrameAction::Deliver(event) => {
                        if !sink.send(TransportEvent::Event(event)).await {
                            let _ = ws_tx.close().await;
                            return None;
                        }
                    }
                    FrameAction::Closed(reason) => return Some(reason),
                }
            }
        }
    }
}

/// What the pump does with one inbound text frame.
#[derive(Debug, PartialEq)]
pub(crate) enum FrameAction {
    Ignore,
    Reply(&'static str),
    Deliver(ServerEvent),
    Closed(String),
}

pub(crate) fn interpret(frame: &str) -> FrameAction {
    let packet = match EnginePacket::decode(frame) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "dropping undecodable frame");
            return FrameAction::Ignore;
        }
    };
    match packet {
        EnginePacket::Ping => FrameAction::Reply(ENGINE_PONG),
        EnginePacket::Close => FrameAction::Closed("server closed the session".to_string()),
        EnginePacket::Message(body) => match SocketPacket::decode(&body) {
            Ok(SocketPacket::Event { name, args, .. }) => {
                match ServerEvent::decode(&name, args.into_iter().next()) {
                    Ok(event) => FrameAction::Deliver(event),
                    Err(e @ EventDecodeError::Unknown(_)) => {
                        debug!(error = %e, "dropping event");
                        FrameAction::Ignore
                    }
                    Err(e) => {
                        warn!(error = %e, "dropping event with malformed payload");
                        FrameAction::Ignore
                    }
                }
            }
            Ok(SocketPacket::Disconnect) => {
                FrameAction::Closed("server disconnected the socket".to_string())
            }
            Ok(SocketPacket::ConnectError(message)) => FrameAction::Closed(message),
            Ok(_) => FrameAction::Ignore,
            Err(e) => {
                warn!(error = %e, "dropping malformed socket.io packet");
                FrameAction::Ignore
            }
        },
        _ => FrameAction::Ignore,
    }
}
