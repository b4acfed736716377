//! Message passing between the caller and the relay worker
//!
//! Inbound: [`Task`] messages. Outbound: relayed results posted through a
//! [`ReplySink`], normally the sending half of a tokio mpsc channel.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Reply channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, MessagingError>;

/// Request for one relayed GET
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifies the requester to the remote endpoint
    pub from: String,
    /// Ask the endpoint to add artificial latency
    #[serde(default, deserialize_with = "truthy")]
    pub delay: bool,
}

impl Task {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            delay: false,
        }
    }

    pub fn delayed(mut self) -> Self {
        self.delay = true;
        self
    }
}

/// Callers send loosely-typed flags (`1`, `"yes"`, `null`), so `delay` follows
/// truthiness rather than requiring a JSON boolean.
fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    })
}

/// Outbound channel back to the caller
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Post one relayed result
    async fn post(&self, result: Value) -> Result<()>;
}

#[async_trait]
impl ReplySink for mpsc::Sender<Value> {
    async fn post(&self, result: Value) -> Result<()> {
        self.send(result)
            .await
            .map_err(|_| MessagingError::ChannelClosed)
    }
}
