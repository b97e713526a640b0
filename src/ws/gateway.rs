//! Control frame construction for the subscription/send gateway.

use serde::Serialize;
use serde_json::Value;

use super::error::WsError;
use crate::Result;

/// Subscription action type.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionAction {
    /// Subscribe to topics
    Subscribe,
    /// Unsubscribe from topics
    Unsubscribe,
}

/// Serialize `message` and inject the `action` discriminator.
///
/// Every field of `message` is kept as is. `message` must serialize to a JSON
/// object; an `action` field it already carries is replaced.
pub(crate) fn envelope<S: Serialize>(action: SubscriptionAction, message: &S) -> Result<String> {
    let mut value = serde_json::to_value(message)?;
    match &mut value {
        Value::Object(fields) => {
            fields.insert("action".to_owned(), Value::String(action.to_string()));
        }
        other => {
            return Err(WsError::InvalidMessage(format!(
                "{action} message must be a JSON object, got {other}"
            ))
            .into());
        }
    }

    Ok(serde_json::to_string(&value)?)
}
