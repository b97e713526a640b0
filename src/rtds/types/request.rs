use bon::Builder;
use secrecy::ExposeSecret as _;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use super::response::CommentType;
use super::topic;
use crate::auth::{ApiKey, Credentials};

/// Body of a `subscribe` or `unsubscribe` control frame.
///
/// The connection adds the `action` field when sending, so one value can be
/// used for both directions.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionMessage {
    pub subscriptions: Vec<Subscription>,
}

impl SubscriptionMessage {
    #[must_use]
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self { subscriptions }
    }
}

/// Wallet whose Gamma-side private streams are requested.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GammaAuth {
    pub address: String,
}

impl GammaAuth {
    #[must_use]
    pub fn new(address: String) -> Self {
        Self { address }
    }
}

/// One entry of a subscription request.
///
/// `filters` is sent as given. Most topics take a JSON array or object; the
/// Chainlink feed takes a string holding JSON, which
/// [`Subscription::chainlink_prices`] builds.
///
/// Serialising reveals `clob_auth` in plaintext. Only send subscriptions over
/// `wss://` and never log the serialised form.
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
pub struct Subscription {
    #[builder(into)]
    pub topic: String,
    /// Event type within the topic, `*` for all of them
    #[builder(into)]
    pub msg_type: String,
    #[builder(into)]
    pub filters: Option<Value>,
    pub clob_auth: Option<Credentials>,
    pub gamma_auth: Option<GammaAuth>,
}

impl Subscription {
    /// Subscribe to `msg_type` events on any topic.
    #[must_use]
    pub fn new(topic: String, msg_type: String) -> Self {
        Self {
            topic,
            msg_type,
            filters: None,
            clob_auth: None,
            gamma_auth: None,
        }
    }

    /// Binance price updates, for every symbol or only the listed ones (`btcusdt`, ...).
    #[must_use]
    pub fn crypto_prices(symbols: Option<Vec<String>>) -> Self {
        Self {
            filters: symbols.map(Value::from),
            ..Self::new(topic::CRYPTO_PRICES.to_owned(), "update".to_owned())
        }
    }

    /// Chainlink price updates, for every feed or a single one (`eth/usd`, ...).
    #[must_use]
    pub fn chainlink_prices(symbol: Option<String>) -> Self {
        let filters = symbol.map(|symbol| Value::String(json!({ "symbol": symbol }).to_string()));
        Self {
            filters,
            ..Self::new(topic::CHAINLINK_PRICES.to_owned(), "*".to_owned())
        }
    }

    /// Comment events of one type, or all of them.
    #[must_use]
    pub fn comments(msg_type: Option<CommentType>) -> Self {
        let msg_type = msg_type.as_ref().map_or("*", CommentType::as_str).to_owned();
        Self::new(topic::COMMENTS.to_owned(), msg_type)
    }

    /// Trades from the activity feed.
    ///
    /// `filter` narrows the feed, e.g. `{"event_slug":"..."}` or `{"market_slug":"..."}`.
    #[must_use]
    pub fn activity_trades(filter: Option<Value>) -> Self {
        Self::activity("trades".to_owned(), filter)
    }

    /// Any event type of the activity feed: `trades`, `orders_matched` or `*`.
    #[must_use]
    pub fn activity(msg_type: String, filter: Option<Value>) -> Self {
        Self {
            filters: filter,
            ..Self::new(topic::ACTIVITY.to_owned(), msg_type)
        }
    }

    /// Order and trade events of the account behind `credentials`.
    #[must_use]
    pub fn clob_user(credentials: Credentials) -> Self {
        Self::new(topic::CLOB_USER.to_owned(), "*".to_owned()).with_clob_auth(credentials)
    }

    #[must_use]
    pub fn with_clob_auth(mut self, credentials: Credentials) -> Self {
        self.clob_auth = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_gamma_auth(mut self, auth: GammaAuth) -> Self {
        self.gamma_auth = Some(auth);
        self
    }

    #[must_use]
    pub fn with_filters<V: Into<Value>>(mut self, filters: V) -> Self {
        self.filters = Some(filters.into());
        self
    }
}

impl Serialize for Subscription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireSubscription {
            topic: &self.topic,
            msg_type: &self.msg_type,
            filters: self.filters.as_ref(),
            clob_auth: self.clob_auth.as_ref().map(|credentials| ClobAuth {
                key: credentials.key,
                secret: credentials.secret.expose_secret(),
                passphrase: credentials.passphrase.expose_secret(),
            }),
            gamma_auth: self.gamma_auth.as_ref(),
        }
        .serialize(serializer)
    }
}

#[derive(Serialize)]
struct WireSubscription<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    msg_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clob_auth: Option<ClobAuth<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gamma_auth: Option<&'a GammaAuth>,
}

/// `clob_auth` as the server reads it, secrets in the clear.
#[derive(Serialize)]
struct ClobAuth<'a> {
    key: ApiKey,
    secret: &'a str,
    passphrase: &'a str,
}
