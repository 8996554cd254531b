//! Control messages posted to a worker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instruction tag that forces a waiting version to take over.
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// The only message shape the worker acts on: `{"type": "SKIP_WAITING"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
}

impl ControlMessage {
    /// Recognize a control message in an arbitrary posted value.
    ///
    /// Accepts the tagged object form and the bare `"SKIP_WAITING"` string.
    /// Returns `None` for anything else.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(tag) if tag == SKIP_WAITING => Some(ControlMessage::SkipWaiting),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}
