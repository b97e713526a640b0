//! Live RTDS walkthrough.
//!
//! Connects to the production RTDS endpoint, subscribes from the `on_connect`
//! callback (so the subscriptions come back after every reconnect) and prints:
//! 1. Binance prices for BTC and ETH
//! 2. Chainlink price feeds
//! 3. Comment events, if any arrive
//!
//! Run with:
//! ```sh
//! RUST_LOG=info cargo run --example rtds_crypto_prices
//! ```

use std::time::Duration;

use futures::StreamExt as _;
use polymarket_rtds_client::rtds::{Client, CommentType, Subscription};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::builder()
        .on_status_change(|status| info!(%status, "connection status"))
        .on_error(|e| warn!(error = %e, "client error"))
        .on_connect(|client| {
            let subscriptions = vec![
                Subscription::crypto_prices(Some(vec!["btcusdt".to_owned(), "ethusdt".to_owned()])),
                Subscription::chainlink_prices(None),
                Subscription::comments(Some(CommentType::CommentCreated)),
            ];
            if let Err(e) = client.subscribe(subscriptions) {
                warn!(error = %e, "subscribe failed");
            }
        })
        .build()?;

    // Streams only see messages received after they are created
    let mut prices = Box::pin(client.crypto_prices());
    let mut chainlink = Box::pin(client.chainlink_prices());
    let mut comments = Box::pin(client.comments());

    client.connect()?;

    let mut count = 0;
    while let Ok(Some(result)) = timeout(Duration::from_secs(10), prices.next()).await {
        match result {
            Ok(price) => {
                info!(
                    stream = "crypto_prices",
                    symbol = %price.symbol.to_uppercase(),
                    value = %price.value,
                    timestamp = %price.timestamp
                );
                count += 1;
                if count >= 5 {
                    break;
                }
            }
            Err(e) => debug!(stream = "crypto_prices", error = %e),
        }
    }
    info!(stream = "crypto_prices", received = count);

    count = 0;
    while let Ok(Some(result)) = timeout(Duration::from_secs(5), chainlink.next()).await {
        match result {
            Ok(price) => {
                info!(
                    stream = "chainlink_prices",
                    symbol = %price.symbol,
                    value = %price.value
                );
                count += 1;
                if count >= 3 {
                    break;
                }
            }
            Err(e) => debug!(stream = "chainlink_prices", error = %e),
        }
    }
    info!(stream = "chainlink_prices", received = count);

    // Comments may be infrequent, use a shorter timeout
    count = 0;
    while let Ok(Some(result)) = timeout(Duration::from_secs(3), comments.next()).await {
        match result {
            Ok(comment) => {
                info!(
                    stream = "comments",
                    id = %comment.id,
                    parent_type = ?comment.parent_entity_type,
                    parent_id = %comment.parent_entity_id
                );
                count += 1;
                if count >= 3 {
                    break;
                }
            }
            Err(e) => debug!(stream = "comments", error = %e),
        }
    }
    if count == 0 {
        debug!(stream = "comments", "no comments received within timeout");
    }

    client.disconnect()?;
    Ok(())
}
