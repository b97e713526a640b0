//! Owner callbacks invoked by the connection driver.
//!
//! Every callback runs on the driver task, in event order, one at a time. A
//! callback that blocks stalls the whole connection, so hand heavy work off to
//! another task.

use std::fmt;
use std::sync::Arc;

use super::connection::{ConnectionManager, ConnectionStatus};
use crate::error::Error;

pub type OnConnect<M> = Arc<dyn Fn(&ConnectionManager<M>) + Send + Sync>;
pub type OnMessage<M> = Arc<dyn Fn(&M) + Send + Sync>;
pub type OnStatusChange = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;
pub type OnError = Arc<dyn Fn(&Error) + Send + Sync>;

/// Callbacks through which a [`ConnectionManager`] reports to its owner.
///
/// All callbacks are optional.
///
/// # Example
///
/// ```
/// use polymarket_rtds_client::ws::{ConnectionManager, Handlers, JsonObject};
/// use serde_json::json;
///
/// let handlers = Handlers::new()
///     .on_connect(|connection: &ConnectionManager<JsonObject>| {
///         // no registry, re-subscribe on every (re)connect
///         _ = connection.subscribe(&json!({"topic": "trades"}));
///     })
///     .on_message(|message: &JsonObject| println!("{message:?}"))
///     .on_status_change(|status| println!("{status}"));
/// # drop(handlers);
/// ```
pub struct Handlers<M> {
    pub(crate) on_connect: Option<OnConnect<M>>,
    pub(crate) on_message: Option<OnMessage<M>>,
    pub(crate) on_status_change: Option<OnStatusChange>,
    pub(crate) on_error: Option<OnError>,
}

impl<M> Default for Handlers<M> {
    fn default() -> Self {
        Self {
            on_connect: None,
            on_message: None,
            on_status_change: None,
            on_error: None,
        }
    }
}

impl<M> Clone for Handlers<M> {
    fn clone(&self) -> Self {
        Self {
            on_connect: self.on_connect.clone(),
            on_message: self.on_message.clone(),
            on_status_change: self.on_status_change.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<M> fmt::Debug for Handlers<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_status_change", &self.on_status_change.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<M> Handlers<M> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after every successful open, with a handle to the connection.
    #[must_use]
    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConnectionManager<M>) + Send + Sync + 'static,
    {
        self.on_connect = Some(Arc::new(f));
        self
    }

    /// Called once per parsed message.
    #[must_use]
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.on_message = Some(Arc::new(f));
        self
    }

    /// Called once per status transition.
    #[must_use]
    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        self.on_status_change = Some(Arc::new(f));
        self
    }

    /// Called for transport errors, malformed frames and liveness timeouts.
    #[must_use]
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }
}
