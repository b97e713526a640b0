#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    unused,
    reason = "Not every test binary uses every helper"
)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt as _, StreamExt as _};
use polymarket_rtds_client::ws::ConnectionStatus;
use polymarket_rtds_client::ws::config::{Config, ReconnectStrategy};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
enum ServerCommand {
    Text(String),
    Binary(Vec<u8>),
    /// Drop every open connection without a close frame
    Drop,
}

/// How the mock server answers a `PING` text frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PongMode {
    /// `PONG` text frame
    Text,
    /// WebSocket-level pong control frame
    Frame,
    /// No answer at all
    Silent,
}

/// Mock RTDS server.
///
/// Answers `PING` as told by its [`PongMode`] and forwards every other text
/// frame it receives to [`MockWsServer::recv_frame`].
pub struct MockWsServer {
    addr: SocketAddr,
    commands: broadcast::Sender<ServerCommand>,
    frames: mpsc::UnboundedReceiver<String>,
    accepted: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    pings: Arc<AtomicUsize>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        Self::start_with(PongMode::Text).await
    }

    pub async fn start_with(pong: PongMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (commands, _) = broadcast::channel::<ServerCommand>(100);
        let (frame_tx, frames) = mpsc::unbounded_channel::<String>();
        let accepted = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicUsize::new(0));
        let pings = Arc::new(AtomicUsize::new(0));

        let server = (
            commands.clone(),
            Arc::clone(&accepted),
            Arc::clone(&open),
            Arc::clone(&pings),
        );
        tokio::spawn(async move {
            let (commands, accepted, open, pings) = server;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };

                let Ok(ws_stream) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                accepted.fetch_add(1, Ordering::SeqCst);
                open.fetch_add(1, Ordering::SeqCst);

                let (mut write, mut read) = ws_stream.split();
                let frame_tx = frame_tx.clone();
                let mut command_rx = commands.subscribe();
                let open = Arc::clone(&open);
                let pings = Arc::clone(&pings);

                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            msg = read.next() => {
                                match msg {
                                    Some(Ok(Message::Text(text))) if text.as_str() == "PING" => {
                                        pings.fetch_add(1, Ordering::SeqCst);
                                        let reply = match pong {
                                            PongMode::Text => Message::Text("PONG".into()),
                                            PongMode::Frame => Message::Pong(Vec::new().into()),
                                            PongMode::Silent => continue,
                                        };
                                        if write.send(reply).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(Ok(Message::Text(text))) => {
                                        drop(frame_tx.send(text.to_string()));
                                    }
                                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                                    Some(Ok(_)) => {}
                                }
                            }
                            command = command_rx.recv() => {
                                match command {
                                    Ok(ServerCommand::Text(text)) => {
                                        if write.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(ServerCommand::Binary(bytes)) => {
                                        if write.send(Message::Binary(bytes.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Ok(ServerCommand::Drop) | Err(_) => break,
                                }
                            }
                        }
                    }
                    open.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        Self {
            addr,
            commands,
            frames,
            accepted,
            open,
            pings,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a text frame to every connected client.
    pub fn send(&self, message: &str) {
        drop(self.commands.send(ServerCommand::Text(message.to_owned())));
    }

    /// Send a binary frame to every connected client.
    pub fn send_binary(&self, bytes: &[u8]) {
        drop(self.commands.send(ServerCommand::Binary(bytes.to_vec())));
    }

    /// Drop every connection without a close handshake.
    pub fn drop_connections(&self) {
        drop(self.commands.send(ServerCommand::Drop));
    }

    /// Number of handshakes accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Next non-heartbeat frame a client sent.
    pub async fn recv_frame(&mut self) -> Option<String> {
        timeout(WAIT, self.frames.recv()).await.ok().flatten()
    }

    /// Whether a client sends anything within `window`.
    pub async fn frame_within(&mut self, window: Duration) -> Option<String> {
        timeout(window, self.frames.recv()).await.ok().flatten()
    }
}

/// Address nothing is listening on.
pub async fn unused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}

/// Short timers so liveness and reconnect behaviour shows up quickly.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.heartbeat_interval = Duration::from_millis(100);
    config.heartbeat_timeout = Some(Duration::from_millis(250));
    config.reconnect.strategy = ReconnectStrategy::Fixed(Duration::from_millis(100));
    config
}

/// Wait until `status` is observed on `rx`.
pub async fn wait_for_status(rx: &mut watch::Receiver<ConnectionStatus>, status: ConnectionStatus) {
    timeout(WAIT, rx.wait_for(|current| *current == status))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {status}"))
        .unwrap();
}

/// Poll `condition` until it holds.
pub async fn eventually<F: Fn() -> bool>(condition: F) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

/// Records every status change in order.
#[derive(Clone, Debug, Default)]
pub struct StatusLog(Arc<Mutex<Vec<ConnectionStatus>>>);

impl StatusLog {
    pub fn record(&self) -> impl Fn(ConnectionStatus) + Send + Sync + 'static {
        let log = self.clone();
        move |status| log.0.lock().unwrap().push(status)
    }

    pub fn snapshot(&self) -> Vec<ConnectionStatus> {
        self.0.lock().unwrap().clone()
    }
}
