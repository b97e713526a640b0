#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]

mod common;

use std::sync::{Arc, Mutex};

use common::{MockWsServer, StatusLog, WAIT, fast_config, wait_for_status};
use futures_util::StreamExt as _;
use polymarket_rtds_client::auth::{Credentials, Uuid};
use polymarket_rtds_client::rtds::{
    Client, CommentType, GammaAuth, RtdsMessage, Side, Subscription,
};
use polymarket_rtds_client::types::dec;
use polymarket_rtds_client::ws::ConnectionStatus;
use serde_json::{Value, json};
use tokio::time::timeout;

async fn connected_client(server: &MockWsServer) -> Client {
    let client = Client::builder()
        .host(server.ws_url())
        .config(fast_config())
        .build()
        .unwrap();
    client.connect().unwrap();
    wait_for_status(&mut client.status_receiver(), ConnectionStatus::Connected).await;
    client
}

/// Example payloads captured from the RTDS service.
mod payloads {
    use serde_json::{Value, json};

    pub fn crypto_price(symbol: &str, value: f64) -> Value {
        json!({
            "topic": "crypto_prices",
            "type": "update",
            "timestamp": 1_753_314_064_237_i64,
            "payload": {
                "symbol": symbol,
                "timestamp": 1_753_314_064_213_i64,
                "value": value
            }
        })
    }

    pub fn chainlink_price() -> Value {
        json!({
            "topic": "crypto_prices_chainlink",
            "type": "update",
            "timestamp": 1_753_314_064_237_i64,
            "payload": {
                "symbol": "eth/usd",
                "timestamp": 1_753_314_064_213_i64,
                "value": 3456.78
            }
        })
    }

    pub fn activity_trade() -> Value {
        json!({
            "connection_id": "Pq1ZbfW5oAMCJAQ=",
            "topic": "activity",
            "type": "trades",
            "timestamp": 1_753_454_975_808_i64,
            "payload": {
                "asset": "71321045679252212594626385532706912750332728571942532289631379312455583992563",
                "conditionId": "0x5f65177b394277fd294cd75650044e32ba009a95022d88a0c1d565897d72f8f1",
                "eventSlug": "fed-decision-in-september",
                "outcome": "No",
                "outcomeIndex": 1,
                "price": 0.91,
                "side": "SELL",
                "size": 250,
                "slug": "fed-decreases-interest-rates-by-50-bps",
                "timestamp": 1_753_454_975,
                "title": "Fed decreases interest rates by 50 bps?",
                "name": "whale",
                "pseudonym": "Quiet-Harbor"
            }
        })
    }
}

mod subscriptions {
    use super::*;

    #[tokio::test]
    async fn subscribe_sends_subscriptions_envelope() {
        let mut server = MockWsServer::start().await;
        let client = connected_client(&server).await;

        client
            .subscribe(vec![
                Subscription::crypto_prices(Some(vec!["btcusdt".to_owned()])),
                Subscription::chainlink_prices(Some("eth/usd".to_owned())),
                Subscription::comments(Some(CommentType::ReactionCreated)),
            ])
            .unwrap();

        let frame: Value = serde_json::from_str(&server.recv_frame().await.unwrap()).unwrap();
        assert_eq!(
            frame,
            json!({
                "action": "subscribe",
                "subscriptions": [
                    {"topic": "crypto_prices", "type": "update", "filters": ["btcusdt"]},
                    {"topic": "crypto_prices_chainlink", "type": "*", "filters": "{\"symbol\":\"eth/usd\"}"},
                    {"topic": "comments", "type": "reaction_created"},
                ],
            })
        );
    }

    #[tokio::test]
    async fn unsubscribe_sends_same_subscriptions() {
        let mut server = MockWsServer::start().await;
        let client = connected_client(&server).await;

        client
            .unsubscribe(vec![Subscription::activity_trades(Some(
                json!({"market_slug": "fed-decreases-interest-rates-by-50-bps"}),
            ))])
            .unwrap();

        let frame: Value = serde_json::from_str(&server.recv_frame().await.unwrap()).unwrap();
        assert_eq!(
            frame,
            json!({
                "action": "unsubscribe",
                "subscriptions": [{
                    "topic": "activity",
                    "type": "trades",
                    "filters": {"market_slug": "fed-decreases-interest-rates-by-50-bps"},
                }],
            })
        );
    }

    #[tokio::test]
    async fn credentials_reach_the_wire() {
        let mut server = MockWsServer::start().await;
        let client = connected_client(&server).await;
        let credentials = Credentials::new(Uuid::nil(), "secret".to_owned(), "phrase".to_owned());

        client
            .subscribe(vec![
                Subscription::comments(None)
                    .with_clob_auth(credentials)
                    .with_gamma_auth(GammaAuth::new("0xabc".to_owned())),
            ])
            .unwrap();

        let frame: Value = serde_json::from_str(&server.recv_frame().await.unwrap()).unwrap();
        let subscription = &frame["subscriptions"][0];
        assert_eq!(subscription["clob_auth"]["secret"], "secret");
        assert_eq!(subscription["clob_auth"]["passphrase"], "phrase");
        assert_eq!(subscription["gamma_auth"]["address"], "0xabc");
    }

    #[tokio::test]
    async fn on_connect_resubscribes_after_server_drop() {
        let mut server = MockWsServer::start().await;
        let log = StatusLog::default();
        let client = Client::builder()
            .host(server.ws_url())
            .config(fast_config())
            .on_status_change(log.record())
            .on_connect(|client| {
                client
                    .subscribe(vec![Subscription::crypto_prices(None)])
                    .unwrap();
            })
            .build()
            .unwrap();

        client.connect().unwrap();
        let first = server.recv_frame().await.unwrap();
        server.drop_connections();
        let second = server.recv_frame().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.accepted(), 2);
        assert_eq!(
            log.snapshot()[..4],
            [
                ConnectionStatus::Connecting,
                ConnectionStatus::Connected,
                ConnectionStatus::Disconnected,
                ConnectionStatus::Connecting,
            ]
        );
    }
}

mod streams {
    use super::*;

    #[tokio::test]
    async fn typed_streams_only_see_their_topic() {
        let server = MockWsServer::start().await;
        let client = connected_client(&server).await;
        let mut prices = Box::pin(client.crypto_prices());
        let mut chainlink = Box::pin(client.chainlink_prices());

        server.send(&payloads::chainlink_price().to_string());
        server.send(&payloads::crypto_price("btcusdt", 67_234.5).to_string());

        let price = timeout(WAIT, prices.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(price.symbol, "btcusdt");
        assert_eq!(price.value, dec!(67234.5));

        let price = timeout(WAIT, chainlink.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(price.symbol, "eth/usd");
        assert_eq!(price.value, dec!(3456.78));
    }

    #[tokio::test]
    async fn activity_trades_stream() {
        let server = MockWsServer::start().await;
        let client = connected_client(&server).await;
        let mut trades = Box::pin(client.activity_trades());

        server.send(&payloads::activity_trade().to_string());

        let trade = timeout(WAIT, trades.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.price, dec!(0.91));
        assert_eq!(trade.size, dec!(250));
        assert_eq!(trade.outcome_index, 1);
        assert_eq!(trade.name.as_deref(), Some("whale"));
    }

    #[tokio::test]
    async fn batched_frames_are_split_into_messages() {
        let server = MockWsServer::start().await;
        let seen = Arc::new(Mutex::new(Vec::<RtdsMessage>::new()));
        let sink = Arc::clone(&seen);
        let client = Client::builder()
            .host(server.ws_url())
            .config(fast_config())
            .on_message(move |message| sink.lock().unwrap().push(message.clone()))
            .build()
            .unwrap();
        let mut messages = Box::pin(client.messages());
        client.connect().unwrap();
        wait_for_status(&mut client.status_receiver(), ConnectionStatus::Connected).await;

        let batch = json!([
            payloads::crypto_price("btcusdt", 1.0),
            payloads::crypto_price("ethusdt", 2.0),
        ]);
        server.send(&batch.to_string());

        for symbol in ["btcusdt", "ethusdt"] {
            let message = timeout(WAIT, messages.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(message.as_crypto_price().unwrap().symbol, symbol);
        }
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn message_fields_survive_dispatch() {
        let server = MockWsServer::start().await;
        let client = connected_client(&server).await;
        let mut messages = Box::pin(client.messages());

        server.send(&payloads::activity_trade().to_string());

        let message = timeout(WAIT, messages.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let expected = payloads::activity_trade();
        assert_eq!(message.topic, "activity");
        assert_eq!(message.msg_type, "trades");
        assert_eq!(message.timestamp, 1_753_454_975_808);
        assert_eq!(message.connection_id.as_deref(), Some("Pq1ZbfW5oAMCJAQ="));
        assert_eq!(message.payload, expected["payload"]);
    }

    #[tokio::test]
    async fn blank_frames_are_ignored() {
        let server = MockWsServer::start().await;
        let client = connected_client(&server).await;
        let mut messages = Box::pin(client.messages());

        server.send("   ");
        server.send(&payloads::crypto_price("solusdt", 189.55).to_string());

        let message = timeout(WAIT, messages.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(message.topic, "crypto_prices");
    }
}
