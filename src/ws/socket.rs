//! Per-connection socket task and the process-wide connector hook.
//!
//! Each call to `connect()` spawns one socket task. The task owns the
//! underlying stream and reports what happens to it as [`SocketEvent`]s tagged
//! with the generation it was opened with. The driver drops events whose
//! generation does not match its current socket, so a detached socket can
//! never be observed again.
//!
//! The [`Connector`] hook is shared by every client in the process. Libraries
//! that may run next to an application's own proxy setup should check
//! [`connector_installed`] and leave an existing hook in place.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, client_async_tls, connect_async};
use url::Url;

use super::error::WsError;
use crate::Result;
use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for flushing a close frame on graceful shutdown.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

static CONNECTOR: OnceLock<Arc<dyn Connector>> = OnceLock::new();

/// Opens the TCP stream that a WebSocket handshake runs over.
///
/// Install one with [`install_connector`] to route every client in the process
/// through a proxy or a custom network path. TLS (for `wss://`) is layered on
/// top of the returned stream by the handshake.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<TcpStream>;
}

/// Install the process-wide [`Connector`].
///
/// Must run before the first `connect()` whose traffic should use it. It can
/// only be installed once and is never removed.
pub fn install_connector(connector: Arc<dyn Connector>) -> Result<()> {
    CONNECTOR
        .set(connector)
        .map_err(|_rejected| Error::config("a connector is already installed"))
}

/// Whether a process-wide [`Connector`] has been installed.
///
/// Lets startup code install a default hook only when the application has not
/// already chosen one, since a second [`install_connector`] is rejected.
///
/// ```
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use polymarket_rtds_client::ws::socket::{Connector, connector_installed, install_connector};
/// use tokio::net::TcpStream;
///
/// struct Direct;
///
/// #[async_trait]
/// impl Connector for Direct {
///     async fn connect(&self, host: &str, port: u16) -> std::io::Result<TcpStream> {
///         TcpStream::connect((host, port)).await
///     }
/// }
///
/// if !connector_installed() {
///     install_connector(Arc::new(Direct))?;
/// }
/// assert!(connector_installed());
/// # Ok::<(), polymarket_rtds_client::error::Error>(())
/// ```
#[must_use]
pub fn connector_installed() -> bool {
    CONNECTOR.get().is_some()
}

/// Something that happened to a socket.
#[derive(Debug)]
pub(crate) enum SocketEventKind {
    /// Handshake completed
    Open,
    /// A text frame arrived
    Text(String),
    /// A protocol-level pong frame arrived
    Pong,
    /// A transport error, always followed by [`SocketEventKind::Closed`]
    Error(Error),
    /// The socket is gone, for whatever reason
    Closed,
}

#[derive(Debug)]
pub(crate) struct SocketEvent {
    pub(crate) generation: u64,
    pub(crate) kind: SocketEventKind,
}

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Handle to one socket task, exclusively owned by the driver.
pub(crate) struct Socket {
    generation: u64,
    open: bool,
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl Socket {
    /// Spawn a socket task connecting to `endpoint`.
    pub(crate) fn open(
        endpoint: &Url,
        generation: u64,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let endpoint = endpoint.clone();
        let task = tokio::spawn(async move {
            run(endpoint, generation, outbound_rx, events).await;
        });

        Self {
            generation,
            open: false,
            outbound,
            task,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn mark_open(&mut self) {
        self.open = true;
    }

    /// Queue a text frame. Returns `false` if the socket is not open or its task is gone.
    pub(crate) fn send(&self, text: String) -> bool {
        self.open && self.outbound.send(Outbound::Text(text)).is_ok()
    }

    /// Close gracefully if open, otherwise abort the pending handshake.
    pub(crate) fn close(self) {
        if self.open && self.outbound.send(Outbound::Close).is_ok() {
            return;
        }
        self.task.abort();
    }

    /// Drop the stream without a close handshake.
    pub(crate) fn terminate(self) {
        self.task.abort();
    }
}

async fn run(
    endpoint: Url,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let emit = |kind: SocketEventKind| {
        _ = events.send(SocketEvent { generation, kind });
    };

    let ws_stream = match handshake(&endpoint).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            emit(SocketEventKind::Error(e));
            emit(SocketEventKind::Closed);
            return;
        }
    };
    emit(SocketEventKind::Open);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        emit(SocketEventKind::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Pong(_))) => emit(SocketEventKind::Pong),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Binary frames carry nothing for us; protocol pings are answered by tungstenite.
                    }
                    Some(Err(e)) => {
                        emit(SocketEventKind::Error(e.into()));
                        break;
                    }
                }
            }

            command = outbound.recv() => {
                match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            emit(SocketEventKind::Error(e.into()));
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        _ = timeout(CLOSE_TIMEOUT, write.send(Message::Close(None))).await;
                        break;
                    }
                }
            }
        }
    }

    emit(SocketEventKind::Closed);
}

async fn handshake(endpoint: &Url) -> Result<WsStream> {
    let Some(connector) = CONNECTOR.get() else {
        let (ws_stream, _) = connect_async(endpoint.as_str()).await?;
        return Ok(ws_stream);
    };

    let host = endpoint
        .host_str()
        .ok_or_else(|| Error::config(format!("endpoint {endpoint} has no host")))?;
    let port = endpoint
        .port_or_known_default()
        .ok_or_else(|| Error::config(format!("endpoint {endpoint} has no port")))?;

    let stream = connector
        .connect(host, port)
        .await
        .map_err(WsError::Transport)?;
    let (ws_stream, _) = client_async_tls(endpoint.as_str(), stream).await?;
    Ok(ws_stream)
}
