//! # JSON-Lines Driver
//!
//! Line protocol used by the headless `kasir-register` binary.
//!
//! ```text
//! stdin:  {"id": 1, "channel": "sales:checkout", "payload": {"items": [...]}}
//! stdout: {"id": 1, "ok": "7d0c…"}
//!
//! stdin:  {"channel": "sales:delete", "payload": "missing"}
//! stdout: {"error": {"code": "NOT_FOUND", "message": "Sale not found: missing"}}
//! ```
//!
//! `id` is optional and echoed back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channel::RegisterHandle;
use crate::error::ApiError;

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok(Value),
    Error(ApiError),
}

/// Answers one input line with one output line (no trailing newline).
pub async fn handle_line(handle: &RegisterHandle, line: &str) -> String {
    let response = match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => {
            let outcome = match handle.invoke(&envelope.channel, envelope.payload).await {
                Ok(value) => Outcome::Ok(value),
                Err(err) => Outcome::Error(err),
            };
            Response {
                id: envelope.id,
                outcome,
            }
        }
        Err(err) => Response {
            id: None,
            outcome: Outcome::Error(ApiError::from(err)),
        },
    };

    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(
            r#"{{"error":{{"code":"INTERNAL","message":"Failed to encode response: {}"}}}}"#,
            e
        )
    })
}
