#![expect(
    clippy::module_name_repetitions,
    reason = "Re-exported names intentionally match their modules for API clarity"
)]

//! Real-Time Data Socket (RTDS) client for streaming Polymarket data.
//!
//! This module specialises the generic [`crate::ws::ConnectionManager`] for
//! Polymarket's RTDS service: typed subscriptions on the way out, typed
//! payloads on the way in.
//!
//! # Available Streams
//!
//! - **Crypto Prices (Binance)**: Real-time cryptocurrency price data from Binance
//! - **Crypto Prices (Chainlink)**: Price data from Chainlink oracle networks
//! - **Comments**: Comment events including creations, removals, and reactions
//! - **Activity**: Trades as they are matched, optionally narrowed to one event or market
//!
//! # Example
//!
//! ```rust, no_run
//! use futures::StreamExt;
//! use polymarket_rtds_client::rtds::{Client, Subscription};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::builder()
//!         .on_connect(|client| {
//!             // Subscriptions do not survive a reconnect
//!             _ = client.subscribe(vec![Subscription::crypto_prices(Some(vec![
//!                 "btcusdt".to_owned(),
//!             ]))]);
//!         })
//!         .build()?;
//!
//!     let mut stream = Box::pin(client.crypto_prices());
//!     client.connect()?;
//!
//!     while let Some(price) = stream.next().await {
//!         println!("BTC Price: {:?}", price?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod types;

// Re-export commonly used types
pub use client::{Client, ClientBuilder, DEFAULT_HOST, SimpleParser};
pub use types::request::{GammaAuth, Subscription, SubscriptionMessage};
pub use types::response::{
    ActivityTrade, ChainlinkPrice, Comment, CommentProfile, CommentType, CryptoPrice, PriceUpdate,
    RtdsMessage, Side,
};
pub use types::topic;
