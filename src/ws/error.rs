#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Error establishing the underlying TCP stream through the installed connector
    Transport(std::io::Error),
    /// Error parsing a WebSocket message
    MessageParse(serde_json::Error),
    /// A subscription or control frame was issued while the socket is not open
    NotConnected,
    /// The client has been torn down and no longer accepts commands
    ConnectionClosed,
    /// No PONG was received within the liveness window
    Timeout(Duration),
    /// Received or asked to send an invalid message
    InvalidMessage(String),
    /// Message stream lagged and missed messages
    Lagged {
        /// Number of messages that were missed
        count: u64,
    },
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::Transport(e) => write!(f, "WebSocket transport error: {e}"),
            Self::MessageParse(e) => write!(f, "Failed to parse WebSocket message: {e}"),
            Self::NotConnected => write!(f, "WebSocket is not connected"),
            Self::ConnectionClosed => write!(f, "WebSocket client closed"),
            Self::Timeout(window) => write!(f, "No PONG received within {window:?}"),
            Self::InvalidMessage(msg) => write!(f, "Invalid WebSocket message: {msg}"),
            Self::Lagged { count } => write!(f, "Message stream lagged, missed {count} messages"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::Transport(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            _ => None,
        }
    }
}

impl WsError {
    /// Malformed frames and messages are protocol errors, everything else is about the link.
    #[must_use]
    pub fn kind(&self) -> crate::error::Kind {
        match self {
            Self::MessageParse(_) | Self::InvalidMessage(_) => crate::error::Kind::Protocol,
            _ => crate::error::Kind::WebSocket,
        }
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(e.kind(), e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}
