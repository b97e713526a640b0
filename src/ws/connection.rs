#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt::Debug;

use async_stream::stream;
use futures::Stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use url::Url;

use super::config::Config;
use super::driver::Driver;
use super::error::WsError;
use super::gateway::{SubscriptionAction, envelope};
use super::handlers::Handlers;
use super::traits::MessageParser;
use crate::Result;
use crate::error::{Error, Kind};

/// Broadcast channel capacity for incoming messages.
const BROADCAST_CAPACITY: usize = 1024;

/// Connection state tracking.
///
/// Exactly one status holds at any time. Before the first `connect()` the
/// status is [`ConnectionStatus::Disconnected`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Opening a socket
    Connecting,
    /// Socket open, liveness monitor running
    Connected,
    /// No socket, possibly waiting for a reconnect
    Disconnected,
}

impl ConnectionStatus {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Requests from handles to the driver.
#[derive(Debug)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Send(String),
}

/// Handle to a resilient WebSocket connection.
///
/// All connection state lives on a background driver task; this handle only
/// enqueues commands, so every operation returns immediately and its effect is
/// observed through the [`Handlers`] callbacks, [`ConnectionManager::status`]
/// or the receivers handed out by this type. Cloning the handle is cheap.
/// When the last handle is dropped the driver disconnects and exits.
///
/// The connection is not opened until [`ConnectionManager::connect`] is
/// called. Once open it is kept alive with PING/PONG heartbeats and, unless
/// disabled, re-established after any close.
///
/// # Subscriptions are not remembered
///
/// The manager keeps no registry of subscriptions. Anything subscribed before
/// a reconnect is gone afterwards; send it again from the `on_connect`
/// callback, which runs after every successful open.
///
/// # Example
///
/// ```rust, no_run
/// use polymarket_rtds_client::ws::config::Config;
/// use polymarket_rtds_client::ws::{ConnectionManager, Handlers, JsonObject, JsonParser};
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> polymarket_rtds_client::Result<()> {
///     let connection = ConnectionManager::new(
///         "wss://example.com",
///         Config::default(),
///         JsonParser,
///         Handlers::new()
///             .on_connect(|connection: &ConnectionManager<JsonObject>| {
///                 _ = connection.subscribe(&json!({"topic": "trades"}));
///             })
///             .on_message(|message| println!("Received: {message:?}")),
///     )?;
///
///     connection.connect()?;
///     Ok(())
/// }
/// ```
pub struct ConnectionManager<M> {
    /// Sender for driver commands
    command_tx: mpsc::UnboundedSender<Command>,
    /// Watch channel receiver for status changes
    status_rx: watch::Receiver<ConnectionStatus>,
    /// Broadcast sender for incoming messages
    broadcast_tx: broadcast::Sender<M>,
}

impl<M> Clone for ConnectionManager<M> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            status_rx: self.status_rx.clone(),
            broadcast_tx: self.broadcast_tx.clone(),
        }
    }
}

impl<M> Debug for ConnectionManager<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &*self.status_rx.borrow())
            .finish_non_exhaustive()
    }
}

impl<M> ConnectionManager<M>
where
    M: DeserializeOwned + Debug + Clone + Send + 'static,
{
    /// Create a new connection manager and spawn its driver.
    ///
    /// Must be called from within a tokio runtime. Nothing is connected yet.
    pub fn new<P: MessageParser<M>>(
        endpoint: &str,
        config: Config,
        parser: P,
        handlers: Handlers<M>,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "endpoint must use ws:// or wss://, got {endpoint}"
            )));
        }
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| Error::with_source(Kind::Config, e))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let (driver, events_rx) = Driver::new(
            endpoint,
            &config,
            parser,
            handlers,
            status_tx,
            broadcast_tx.clone(),
            command_tx.downgrade(),
        );
        runtime.spawn(driver.run(command_rx, events_rx));

        Ok(Self {
            command_tx,
            status_rx,
            broadcast_tx,
        })
    }

    pub(crate) fn from_parts(
        command_tx: mpsc::UnboundedSender<Command>,
        status_rx: watch::Receiver<ConnectionStatus>,
        broadcast_tx: broadcast::Sender<M>,
    ) -> Self {
        Self {
            command_tx,
            status_rx,
            broadcast_tx,
        }
    }

    /// Open a new socket, replacing the current one if any.
    ///
    /// Status moves to [`ConnectionStatus::Connecting`] and then, once the
    /// handshake completes, to [`ConnectionStatus::Connected`]. A failed
    /// handshake is reported through `on_error` and treated as a close.
    pub fn connect(&self) -> Result<()> {
        self.command(Command::Connect)
    }

    /// Close the socket, cancel all timers and turn automatic reconnection off.
    ///
    /// A later [`ConnectionManager::connect`] still opens a socket, but it will
    /// not be re-established automatically.
    pub fn disconnect(&self) -> Result<()> {
        self.command(Command::Disconnect)
    }

    /// Send `{"action": "subscribe", ...message}`.
    ///
    /// `message` must serialize to a JSON object. Fails soft with
    /// [`WsError::NotConnected`] while the socket is not open; nothing is
    /// queued for later delivery.
    pub fn subscribe<S: Serialize>(&self, message: &S) -> Result<()> {
        self.send_action(SubscriptionAction::Subscribe, message)
    }

    /// Send `{"action": "unsubscribe", ...message}`. Same rules as [`ConnectionManager::subscribe`].
    pub fn unsubscribe<S: Serialize>(&self, message: &S) -> Result<()> {
        self.send_action(SubscriptionAction::Unsubscribe, message)
    }

    fn send_action<S: Serialize>(&self, action: SubscriptionAction, message: &S) -> Result<()> {
        let frame = envelope(action, message)?;

        if !self.is_connected() {
            #[cfg(feature = "tracing")]
            tracing::warn!(%action, "Cannot {action} while the WebSocket is not connected");
            return Err(WsError::NotConnected.into());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%action, "Sending control frame");
        self.command(Command::Send(frame))
    }

    fn command(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_closed| WsError::ConnectionClosed)?;
        Ok(())
    }

    /// Get the current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Whether the socket is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Subscribe to connection status changes.
    ///
    /// Returns a receiver that notifies when the status changes. This is an
    /// alternative to the `on_status_change` callback.
    #[must_use]
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Stream of every parsed message from now on, across reconnects.
    ///
    /// Each call returns an independent stream. A stream that falls more than
    /// the channel capacity behind yields a [`WsError::Lagged`] error and then
    /// continues with the oldest message still buffered. The stream ends once
    /// the driver and every handle are gone.
    pub fn messages(&self) -> impl Stream<Item = Result<M>> + use<M> {
        let mut rx = self.broadcast_tx.subscribe();

        stream! {
            loop {
                match rx.recv().await {
                    Ok(msg) => yield Ok(msg),
                    Err(RecvError::Lagged(n)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("Message stream lagged, missed {n} messages");
                        yield Err(WsError::Lagged { count: n }.into());
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}
