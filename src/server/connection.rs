//! WebSocket connection driver
//!
//! Owns one accepted socket. The socket is split into a writer task, which
//! drains the peer's outbound queue and sends keepalive pings, and the read
//! loop below, which feeds frames to the [`SessionHandler`]. Whichever side
//! stops first ends the session and triggers cleanup. A close request on the
//! peer handle (eviction by a newer login) also ends the read loop, even when
//! the outbound queue is full.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::error::Result;
use crate::registry::{Outbound, PeerHandle};
use crate::server::config::ServerConfig;
use crate::session::{RelayContext, SessionHandler};

/// How long the writer gets to flush the close frame after cleanup
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Why the read loop stopped
#[derive(Debug)]
enum CloseReason {
    /// Peer sent a close frame
    ClosedByPeer,
    /// Stream ended without a close frame
    Disconnected,
    /// No inbound frame within the idle timeout
    IdleTimeout,
    /// Writer task finished (socket error or close requested)
    WriterStopped,
    /// Close was requested through the peer handle
    CloseRequested,
    /// Read failed
    ReadError(WsError),
}

/// A single accepted connection
pub(crate) struct Connection {
    session_id: u64,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    ctx: RelayContext,
}

impl Connection {
    pub(crate) fn new(
        session_id: u64,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        ctx: RelayContext,
    ) -> Self {
        Self {
            session_id,
            socket,
            peer_addr,
            config,
            ctx,
        }
    }

    /// Run the connection to completion
    pub(crate) async fn run(self) -> Result<()> {
        let Connection {
            session_id,
            socket,
            peer_addr,
            config,
            ctx,
        } = self;

        let ws = tokio_tungstenite::accept_async_with_config(
            socket,
            Some(websocket_config(&config)),
        )
        .await?;
        let (sink, mut stream) = ws.split();

        let (handle, rx) = PeerHandle::channel(session_id, config.outbound_queue_capacity);
        let mut close_signal = handle.close_signal();
        let mut writer = tokio::spawn(write_loop(sink, rx, config.ping_interval));

        let mut session = SessionHandler::new(peer_addr, handle.clone(), ctx);
        session.on_transport_ready();

        let reason = read_loop(
            &mut session,
            &mut stream,
            &mut writer,
            &mut close_signal,
            config.idle_timeout,
        )
        .await;

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            reason = ?reason,
            "Read loop finished"
        );

        session.on_close().await;

        if !matches!(reason, CloseReason::WriterStopped) {
            if handle.close() {
                if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
                    writer.abort();
                }
            } else {
                writer.abort();
            }
        }

        match reason {
            CloseReason::ReadError(e) => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn websocket_config(config: &ServerConfig) -> WebSocketConfig {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.max_message_size);
    ws_config.max_frame_size = Some(config.max_message_size);
    ws_config
}

async fn read_loop<S>(
    session: &mut SessionHandler,
    stream: &mut S,
    writer: &mut JoinHandle<()>,
    close_signal: &mut watch::Receiver<bool>,
    idle_timeout: Option<Duration>,
) -> CloseReason
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = &mut *writer => return CloseReason::WriterStopped,
            _ = close_requested(close_signal) => return CloseReason::CloseRequested,
            frame = next_frame(stream, idle_timeout) => frame,
        };

        let message = match frame {
            None => return CloseReason::IdleTimeout,
            Some(None) => return CloseReason::Disconnected,
            Some(Some(Err(e))) => return CloseReason::ReadError(e),
            Some(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => session.on_text(&text).await,
            Message::Binary(_) => session.on_binary(),
            Message::Close(_) => return CloseReason::ClosedByPeer,
            // Pings are answered by tungstenite; any frame resets the idle timer
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }
}

/// Next frame, or `None` if the idle timeout elapsed first
async fn next_frame<S>(
    stream: &mut S,
    idle_timeout: Option<Duration>,
) -> Option<Option<std::result::Result<Message, WsError>>>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    match idle_timeout {
        Some(timeout) => tokio::time::timeout(timeout, stream.next()).await.ok(),
        None => Some(stream.next().await),
    }
}

/// Resolves once a close is requested; never if the signal can no longer fire
async fn close_requested(close_signal: &mut watch::Receiver<bool>) {
    let requested = close_signal.wait_for(|closed| *closed).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Outbound>,
    ping_interval: Option<Duration>,
) where
    S: Sink<Message> + Unpin,
{
    let mut ping =
        ping_interval.map(|period| tokio::time::interval_at(Instant::now() + period, period));

    loop {
        tokio::select! {
            item = rx.recv() => match item {
                Some(Outbound::Text(text)) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            _ = next_tick(&mut ping) => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn next_tick(ping: &mut Option<Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
