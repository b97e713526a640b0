use std::fmt;
use std::time::Duration;

use futures::Stream;
use futures::StreamExt as _;
use tokio::sync::watch;

use super::types::request::{Subscription, SubscriptionMessage};
use super::types::response::{
    ActivityTrade, ChainlinkPrice, Comment, CryptoPrice, RtdsMessage, parse_messages,
};
use crate::Result;
use crate::error::Error;
use crate::ws::config::{Config, ReconnectConfig};
use crate::ws::{ConnectionManager, ConnectionStatus, Handlers, MessageParser};

/// Production RTDS endpoint.
pub const DEFAULT_HOST: &str = "wss://ws-live-data.polymarket.com";

/// Parses RTDS text frames into [`RtdsMessage`]s.
#[expect(
    clippy::exhaustive_structs,
    reason = "Unit parser is constructed by callers as a bare value"
)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleParser;

impl MessageParser<RtdsMessage> for SimpleParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<RtdsMessage>> {
        parse_messages(bytes)
    }
}

/// RTDS (Real-Time Data Socket) client for streaming Polymarket data.
///
/// The client keeps no record of what it subscribed to. After a reconnect the
/// server has forgotten every subscription too, so subscribe from the
/// [`ClientBuilder::on_connect`] callback, which runs after every successful
/// open.
///
/// # Examples
///
/// ```rust, no_run
/// use futures::StreamExt;
/// use polymarket_rtds_client::rtds::{Client, Subscription};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = Client::builder()
///         .on_connect(|client| {
///             let symbols = vec!["btcusdt".to_owned(), "ethusdt".to_owned()];
///             _ = client.subscribe(vec![Subscription::crypto_prices(Some(symbols))]);
///         })
///         .build()?;
///
///     let mut prices = Box::pin(client.crypto_prices());
///     client.connect()?;
///
///     while let Some(price) = prices.next().await {
///         println!("Price: {:?}", price?);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    connection: ConnectionManager<RtdsMessage>,
}

impl Client {
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client for `host` with default callbacks. Nothing is connected yet.
    pub fn new(host: &str, config: Config) -> Result<Self> {
        Self::builder().host(host).config(config).build()
    }

    /// Open the socket. See [`ConnectionManager::connect`].
    pub fn connect(&self) -> Result<()> {
        self.connection.connect()
    }

    /// Close the socket and stop reconnecting. See [`ConnectionManager::disconnect`].
    pub fn disconnect(&self) -> Result<()> {
        self.connection.disconnect()
    }

    /// Send `{"action":"subscribe","subscriptions":[...]}`.
    ///
    /// Fails with [`crate::ws::WsError::NotConnected`] while the socket is not open.
    pub fn subscribe(&self, subscriptions: Vec<Subscription>) -> Result<()> {
        self.connection
            .subscribe(&SubscriptionMessage::new(subscriptions))
    }

    /// Send `{"action":"unsubscribe","subscriptions":[...]}`.
    pub fn unsubscribe(&self, subscriptions: Vec<Subscription>) -> Result<()> {
        self.connection
            .unsubscribe(&SubscriptionMessage::new(subscriptions))
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    #[must_use]
    pub fn status_receiver(&self) -> watch::Receiver<ConnectionStatus> {
        self.connection.status_receiver()
    }

    /// Every message received from now on, whatever its topic.
    pub fn messages(&self) -> impl Stream<Item = Result<RtdsMessage>> + use<> {
        self.connection.messages()
    }

    /// Binance price updates received from now on.
    ///
    /// Only filters the message stream; subscribe with
    /// [`Subscription::crypto_prices`] for updates to arrive.
    pub fn crypto_prices(&self) -> impl Stream<Item = Result<CryptoPrice>> + use<> {
        self.typed(RtdsMessage::as_crypto_price)
    }

    /// Chainlink price updates received from now on.
    pub fn chainlink_prices(&self) -> impl Stream<Item = Result<ChainlinkPrice>> + use<> {
        self.typed(RtdsMessage::as_chainlink_price)
    }

    /// Comment events received from now on.
    pub fn comments(&self) -> impl Stream<Item = Result<Comment>> + use<> {
        self.typed(RtdsMessage::as_comment)
    }

    /// Trades from the activity feed received from now on.
    pub fn activity_trades(&self) -> impl Stream<Item = Result<ActivityTrade>> + use<> {
        self.typed(RtdsMessage::as_activity_trade)
    }

    fn typed<T>(
        &self,
        extract: fn(&RtdsMessage) -> Option<T>,
    ) -> impl Stream<Item = Result<T>> + use<T> {
        self.messages().filter_map(move |msg_result| async move {
            match msg_result {
                Ok(msg) => extract(&msg).map(Ok),
                Err(e) => Some(Err(e)),
            }
        })
    }

    /// The underlying connection, for sending arbitrary control frames.
    #[must_use]
    pub fn connection(&self) -> &ConnectionManager<RtdsMessage> {
        &self.connection
    }
}

/// Builder for [`Client`].
///
/// Every setting has a default: the production host, a 5 second heartbeat and
/// automatic reconnection with a fixed 5 second delay.
#[must_use]
pub struct ClientBuilder {
    host: String,
    config: Config,
    handlers: Handlers<RtdsMessage>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            config: Config::default(),
            handlers: Handlers::default(),
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl ClientBuilder {
    /// WebSocket endpoint, `ws://` or `wss://`.
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    /// Replace the whole connection config.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// How often a PING is sent while connected.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// How long to wait for a PONG before the connection is considered dead.
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.config.heartbeat_timeout = Some(timeout);
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    pub fn reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.config.reconnect = reconnect;
        self
    }

    /// Called after every successful open, including reconnects.
    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(&Client) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_connect(move |connection| {
            f(&Client {
                connection: connection.clone(),
            });
        });
        self
    }

    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&RtdsMessage) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_message(f);
        self
    }

    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_status_change(f);
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.handlers = self.handlers.on_error(f);
        self
    }

    /// Spawn the connection driver. Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Client> {
        let connection =
            ConnectionManager::new(&self.host, self.config, SimpleParser, self.handlers)?;
        Ok(Client { connection })
    }
}
