//! The connection state machine.
//!
//! One driver task per [`ConnectionManager`] owns the socket and every timer.
//! Commands from handles, socket events and timer expiries are handled one at
//! a time on this task, so no lock guards any connection state.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, mpsc, watch};
use url::Url;

use super::config::Config;
use super::connection::{Command, ConnectionManager, ConnectionStatus};
use super::error::WsError;
use super::handlers::Handlers;
use super::heartbeat::{Heartbeat, HeartbeatEvent};
use super::reconnect::{Reconnect, Schedule};
use super::socket::{Socket, SocketEvent, SocketEventKind};
use super::traits::MessageParser;
use crate::error::Error;

/// Heartbeat sent by the client.
pub const PING: &str = "PING";
/// Liveness reply sent by the server. Never delivered as a message.
pub const PONG: &str = "PONG";

pub(crate) struct Driver<M, P> {
    endpoint: Url,
    parser: P,
    handlers: Handlers<M>,
    status_tx: watch::Sender<ConnectionStatus>,
    broadcast_tx: broadcast::Sender<M>,
    /// Weak so that the driver exits once every handle is dropped
    command_tx: mpsc::WeakUnboundedSender<Command>,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    auto_reconnect: bool,
    generation: u64,
    socket: Option<Socket>,
    heartbeat: Heartbeat,
    reconnect: Reconnect,
}

impl<M, P> Driver<M, P>
where
    M: DeserializeOwned + Debug + Clone + Send + 'static,
    P: MessageParser<M>,
{
    pub(crate) fn new(
        endpoint: Url,
        config: &Config,
        parser: P,
        handlers: Handlers<M>,
        status_tx: watch::Sender<ConnectionStatus>,
        broadcast_tx: broadcast::Sender<M>,
        command_tx: mpsc::WeakUnboundedSender<Command>,
    ) -> (Self, mpsc::UnboundedReceiver<SocketEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let driver = Self {
            endpoint,
            parser,
            handlers,
            status_tx,
            broadcast_tx,
            command_tx,
            events_tx,
            auto_reconnect: config.auto_reconnect,
            generation: 0,
            socket: None,
            heartbeat: Heartbeat::new(config.heartbeat_interval, config.pong_timeout()),
            reconnect: Reconnect::new(&config.reconnect),
        };

        (driver, events_rx)
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<SocketEvent>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(command) = command else {
                        // Every handle is gone
                        self.disconnect();
                        break;
                    };
                    self.handle_command(command);
                }

                Some(event) = events.recv() => self.handle_event(event),

                heartbeat = self.heartbeat.next() => self.handle_heartbeat(heartbeat),

                () = self.reconnect.fired() => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = self.reconnect.attempts(), "Reconnecting");
                    self.connect();
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint, "WebSocket driver stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect(),
            Command::Send(frame) => self.send(frame),
        }
    }

    fn connect(&mut self) {
        if self.reconnect.cancel() {
            #[cfg(feature = "tracing")]
            tracing::debug!("Pending reconnect superseded by connect");
        }

        if let Some(socket) = self.socket.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(generation = socket.generation(), "Detaching previous socket");
            self.heartbeat.stop();
            socket.close();
        }

        self.generation = self.generation.wrapping_add(1);
        self.set_status(ConnectionStatus::Connecting);

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoint = %self.endpoint, generation = self.generation, "Connecting");
        self.socket = Some(Socket::open(
            &self.endpoint,
            self.generation,
            self.events_tx.clone(),
        ));
    }

    fn disconnect(&mut self) {
        self.auto_reconnect = false;
        self.reconnect.cancel();
        self.heartbeat.stop();
        if let Some(socket) = self.socket.take() {
            socket.close();
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn send(&self, frame: String) {
        let sent = self
            .socket
            .as_ref()
            .is_some_and(|socket| socket.send(frame));

        if !sent {
            #[cfg(feature = "tracing")]
            tracing::warn!("Dropping control frame, the WebSocket is no longer connected");
            self.report(&WsError::NotConnected.into());
        }
    }

    fn handle_event(&mut self, event: SocketEvent) {
        if self.socket.as_ref().map(Socket::generation) != Some(event.generation) {
            #[cfg(feature = "tracing")]
            tracing::trace!(generation = event.generation, "Ignoring event from detached socket");
            return;
        }

        match event.kind {
            SocketEventKind::Open => self.on_open(),
            SocketEventKind::Text(text) => self.dispatch(&text),
            SocketEventKind::Pong => self.on_pong(),
            SocketEventKind::Error(e) => {
                // A close always follows, recovery is driven from there
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "WebSocket transport error");
                self.report(&e);
            }
            SocketEventKind::Closed => {
                self.socket = None;
                self.on_close();
            }
        }
    }

    fn on_open(&mut self) {
        if let Some(socket) = self.socket.as_mut() {
            socket.mark_open();
        }
        self.reconnect.reset();
        self.set_status(ConnectionStatus::Connected);
        self.heartbeat.start();

        if let Some(on_connect) = &self.handlers.on_connect
            && let Some(command_tx) = self.command_tx.upgrade()
        {
            let connection = ConnectionManager::from_parts(
                command_tx,
                self.status_tx.subscribe(),
                self.broadcast_tx.clone(),
            );
            on_connect(&connection);
        }
    }

    fn on_close(&mut self) {
        self.heartbeat.stop();
        self.set_status(ConnectionStatus::Disconnected);

        if !self.auto_reconnect {
            return;
        }

        let schedule = self.reconnect.schedule();
        #[cfg(feature = "tracing")]
        match schedule {
            Schedule::Scheduled(delay) => tracing::debug!(
                ?delay,
                attempt = self.reconnect.attempts(),
                "Reconnect scheduled"
            ),
            Schedule::AlreadyPending => tracing::debug!("Reconnect already pending"),
            Schedule::Exhausted => tracing::warn!(
                attempts = self.reconnect.attempts(),
                "Reconnect attempts exhausted, staying disconnected"
            ),
        }
        #[cfg(not(feature = "tracing"))]
        let _: Schedule = schedule;
    }

    fn on_pong(&mut self) {
        let expected = self.heartbeat.pong_received();
        #[cfg(feature = "tracing")]
        tracing::trace!(expected, "PONG received");
        #[cfg(not(feature = "tracing"))]
        let _: bool = expected;
    }

    fn dispatch(&mut self, text: &str) {
        if text == PONG {
            self.on_pong();
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(%text, "Received WebSocket text message");

        match self.parser.parse(text.as_bytes()) {
            Ok(messages) => {
                for message in messages {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(?message, "Parsed WebSocket message");
                    if let Some(on_message) = &self.handlers.on_message {
                        on_message(&message);
                    }
                    _ = self.broadcast_tx.send(message);
                }
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%text, error = %e, "Failed to parse WebSocket message");
                self.report(&e);
            }
        }
    }

    fn handle_heartbeat(&mut self, event: HeartbeatEvent) {
        match event {
            HeartbeatEvent::Tick => {
                let sent = self
                    .socket
                    .as_ref()
                    .is_some_and(|socket| socket.send(PING.to_owned()));
                if sent {
                    self.heartbeat.arm_pong_timeout();
                }
            }
            HeartbeatEvent::Timeout => {
                let window = self.heartbeat.timeout();
                #[cfg(feature = "tracing")]
                tracing::warn!("Heartbeat timeout: no PONG received within {window:?}");
                self.report(&WsError::Timeout(window).into());

                if let Some(socket) = self.socket.take() {
                    socket.terminate();
                }
                self.on_close();
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        if changed {
            #[cfg(feature = "tracing")]
            tracing::debug!(%status, "WebSocket status changed");
            if let Some(on_status_change) = &self.handlers.on_status_change {
                on_status_change(status);
            }
        }
    }

    fn report(&self, error: &Error) {
        if let Some(on_error) = &self.handlers.on_error {
            on_error(error);
        }
    }
}
