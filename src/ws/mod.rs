//! Core WebSocket infrastructure.
//!
//! This module provides a resilient, generic connection manager that can be
//! specialized for different streaming services through a [`MessageParser`].
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: handle to a connection with heartbeat and reconnection
//! - [`Handlers`]: owner callbacks for connect, message, status and error events
//! - [`MessageParser`]: trait for parsing incoming text frames
//! - [`socket::Connector`]: process-wide hook for opening the underlying TCP stream
//!
//! # Example
//!
//! ```rust, no_run
//! use polymarket_rtds_client::ws::config::Config;
//! use polymarket_rtds_client::ws::{ConnectionManager, Handlers, JsonObject, JsonParser};
//!
//! # #[tokio::main]
//! # async fn main() -> polymarket_rtds_client::Result<()> {
//! let handlers = Handlers::<JsonObject>::new().on_message(|message| println!("{message:?}"));
//! let connection = ConnectionManager::new("wss://example.com", Config::default(), JsonParser, handlers)?;
//! connection.connect()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
mod driver;
pub mod error;
pub mod gateway;
pub mod handlers;
mod heartbeat;
mod reconnect;
pub mod socket;
pub mod traits;

pub use connection::{ConnectionManager, ConnectionStatus};
pub use driver::{PING, PONG};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use gateway::SubscriptionAction;
pub use handlers::Handlers;
pub use traits::*;
