//! Core traits for generic WebSocket infrastructure.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A JSON object payload, as delivered by [`JsonParser`].
pub type JsonObject = Map<String, Value>;

/// Message parser trait for converting raw frames to messages.
///
/// The dispatcher hands every text frame that is not a heartbeat reply to the
/// parser. A parse error is reported and the frame dropped; the connection
/// stays up.
///
/// # Example
///
/// ```
/// use polymarket_rtds_client::ws::MessageParser;
///
/// #[derive(Debug, Clone, serde::Deserialize)]
/// struct Tick {
///     seq: u64,
/// }
///
/// struct TickParser;
///
/// impl MessageParser<Tick> for TickParser {
///     fn parse(&self, bytes: &[u8]) -> polymarket_rtds_client::Result<Vec<Tick>> {
///         let tick: Tick = serde_json::from_slice(bytes)?;
///         Ok(vec![tick])
///     }
/// }
///
/// assert_eq!(TickParser.parse(br#"{"seq":7}"#)?[0].seq, 7);
/// # Ok::<(), polymarket_rtds_client::error::Error>(())
/// ```
pub trait MessageParser<M: DeserializeOwned>: Send + Sync + 'static {
    /// Parse incoming bytes into messages.
    ///
    /// May return an empty vec if the frame carries nothing of interest.
    fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<M>>;
}

/// Parses every frame as a single JSON object.
///
/// Valid JSON that is not an object (arrays, numbers, strings) is rejected.
/// Stateless, so callers name it as a plain value.
///
/// ```
/// use polymarket_rtds_client::ws::{JsonParser, MessageParser as _};
///
/// let messages = JsonParser.parse(br#"{"topic":"X"}"#)?;
/// assert_eq!(messages[0]["topic"], "X");
/// # Ok::<(), polymarket_rtds_client::error::Error>(())
/// ```
#[expect(
    clippy::exhaustive_structs,
    reason = "Unit parser is constructed by callers as a bare value"
)]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl MessageParser<JsonObject> for JsonParser {
    fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<JsonObject>> {
        let object: JsonObject =
            serde_json::from_slice(bytes).map_err(super::error::WsError::MessageParse)?;
        Ok(vec![object])
    }
}
