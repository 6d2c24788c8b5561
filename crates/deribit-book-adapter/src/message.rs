/*
[INPUT]:  Raw WebSocket message payloads
[OUTPUT]: Parsed JSON documents and their display form
[POS]:    Protocol layer - inbound message decoding
[UPDATE]: When changing how payloads are validated or rendered
*/

use serde_json::Value;

use crate::error::DecodeError;

/// Parse one message. Any well-formed JSON document is accepted; no
/// JSON-RPC structure is checked.
pub fn decode_message(raw: &str) -> Result<Value, DecodeError> {
    serde_json::from_str(raw).map_err(|source| DecodeError {
        raw: raw.to_string(),
        source,
    })
}

/// Human readable rendering used for console output
pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
