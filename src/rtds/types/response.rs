//! Frames received from RTDS.
//!
//! Every frame decodes to an [`RtdsMessage`] whose payload stays raw JSON.
//! Typed payloads are decoded on demand, once the topic says what to expect.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::topic;
use crate::Timestamp;
use crate::types::Decimal;
use crate::ws::WsError;

/// Wallet addresses are kept as the hex strings the server sends.
pub type Address = String;

/// Envelope shared by every RTDS frame.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
pub struct RtdsMessage {
    pub topic: String,
    /// Event type within the topic, e.g. `update` or `comment_created`
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Milliseconds since the epoch
    pub timestamp: Timestamp,
    pub payload: Value,
    /// Set by the server on some topics
    #[serde(default)]
    pub connection_id: Option<String>,
}

impl RtdsMessage {
    /// Whether this frame was published on `topic`, with `msg_type` when one is given.
    #[must_use]
    pub fn is(&self, topic: &str, msg_type: Option<&str>) -> bool {
        self.topic == topic && msg_type.is_none_or(|msg_type| self.msg_type == msg_type)
    }

    /// Decode the payload as `T`, whatever the topic.
    ///
    /// Fails with [`WsError::MessageParse`] when the payload does not have the shape of `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<T> {
        T::deserialize(&self.payload).map_err(|e| WsError::MessageParse(e).into())
    }

    /// Server time of the frame.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    #[must_use]
    pub fn as_crypto_price(&self) -> Option<CryptoPrice> {
        self.view(topic::CRYPTO_PRICES, None)
    }

    #[must_use]
    pub fn as_chainlink_price(&self) -> Option<ChainlinkPrice> {
        self.view(topic::CHAINLINK_PRICES, None)
    }

    /// The comment carried by any `comments` event. See [`RtdsMessage::comment_type`]
    /// for what happened to it.
    #[must_use]
    pub fn as_comment(&self) -> Option<Comment> {
        self.view(topic::COMMENTS, None)
    }

    #[must_use]
    pub fn as_activity_trade(&self) -> Option<ActivityTrade> {
        self.view(topic::ACTIVITY, Some("trades"))
    }

    #[must_use]
    pub fn comment_type(&self) -> Option<CommentType> {
        self.is(topic::COMMENTS, None)
            .then(|| CommentType::from(self.msg_type.clone()))
    }

    fn view<T: DeserializeOwned>(&self, topic: &str, msg_type: Option<&str>) -> Option<T> {
        if !self.is(topic, msg_type) {
            return None;
        }
        match self.decode() {
            Ok(payload) => Some(payload),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(topic, error = %e, "Payload does not match its topic");
                #[cfg(not(feature = "tracing"))]
                let _: crate::error::Error = e;
                None
            }
        }
    }
}

/// A tick from one of the price feeds.
///
/// Binance symbols are lowercase pairs (`btcusdt`), Chainlink symbols are
/// slash separated (`btc/usd`).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceUpdate {
    pub symbol: String,
    /// Milliseconds since the epoch, as stamped by the feed
    pub timestamp: Timestamp,
    pub value: Decimal,
}

impl PriceUpdate {
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

/// Binance tick from the `crypto_prices` topic.
pub type CryptoPrice = PriceUpdate;

/// Chainlink tick from the `crypto_prices_chainlink` topic.
pub type ChainlinkPrice = PriceUpdate;

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Set when the comment replies to another comment
    #[serde(rename = "parentCommentID", default)]
    pub parent_comment_id: Option<String>,
    #[serde(rename = "parentEntityID")]
    pub parent_entity_id: i64,
    /// `Event` or `Market`
    pub parent_entity_type: String,
    pub profile: CommentProfile,
    #[serde(default)]
    pub reaction_count: i64,
    #[serde(default)]
    pub report_count: i64,
    pub user_address: Address,
    #[serde(default)]
    pub reply_address: Option<Address>,
}

impl Comment {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.parent_comment_id.is_some()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentProfile {
    pub name: String,
    #[serde(default)]
    pub pseudonym: Option<String>,
    pub base_address: Address,
    #[serde(default)]
    pub proxy_wallet: Option<Address>,
    /// When false, only the pseudonym may be shown
    #[serde(default)]
    pub display_username_public: bool,
}

impl CommentProfile {
    /// The author name to show publicly.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match &self.pseudonym {
            Some(pseudonym) if !self.display_username_public => pseudonym,
            _ => &self.name,
        }
    }
}

/// Event types of the `comments` topic.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CommentType {
    CommentCreated,
    CommentRemoved,
    ReactionCreated,
    ReactionRemoved,
    /// Not known to this crate, kept verbatim
    Other(String),
}

impl CommentType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CommentCreated => "comment_created",
            Self::CommentRemoved => "comment_removed",
            Self::ReactionCreated => "reaction_created",
            Self::ReactionRemoved => "reaction_removed",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for CommentType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "comment_created" => Self::CommentCreated,
            "comment_removed" => Self::CommentRemoved,
            "reaction_created" => Self::ReactionCreated,
            "reaction_removed" => Self::ReactionRemoved,
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

/// A fill from the `activity` topic.
///
/// `name` is only present for traders with a public profile.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTrade {
    /// Outcome token ID
    pub asset: String,
    pub condition_id: String,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    /// Seconds since the epoch, unlike the envelope
    pub timestamp: Timestamp,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub event_slug: String,
    /// `Yes` or `No` on binary markets
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub outcome_index: u32,
    #[serde(default)]
    pub proxy_wallet: Option<Address>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl ActivityTrade {
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Collateral that changed hands.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.price.saturating_mul(self.size)
    }
}

/// Split a text frame into messages.
///
/// A frame holds one envelope or a JSON array of them. Blank frames are
/// keepalives and yield nothing. Malformed frames fail with
/// [`WsError::MessageParse`].
pub fn parse_messages(bytes: &[u8]) -> crate::Result<Vec<RtdsMessage>> {
    let frame = bytes.trim_ascii();
    let messages = match frame.first() {
        None => return Ok(Vec::new()),
        Some(b'[') => serde_json::from_slice(frame),
        Some(_) => serde_json::from_slice(frame).map(|message| vec![message]),
    };
    messages.map_err(|e| WsError::MessageParse(e).into())
}
