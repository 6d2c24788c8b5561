/*
[INPUT]:  Instrument identifier chosen by the operator
[OUTPUT]: JSON-RPC public/subscribe request text
[POS]:    Protocol layer - outbound subscription encoding
[UPDATE]: When changing channel naming or the request envelope
*/

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const JSONRPC_VERSION: &str = "2.0";
/// Only one request is ever in flight, so the id is fixed
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;
pub const SUBSCRIBE_METHOD: &str = "public/subscribe";
pub const BOOK_INTERVAL: &str = "100ms";

/// JSON-RPC 2.0 subscribe request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: SubscribeParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeParams {
    pub channels: Vec<String>,
}

impl SubscriptionRequest {
    /// Order book channel for one instrument at the 100ms interval
    pub fn order_book(instrument: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: SUBSCRIBE_REQUEST_ID,
            method: SUBSCRIBE_METHOD.to_string(),
            params: SubscribeParams {
                channels: vec![book_channel(instrument)],
            },
        }
    }

    /// Compact JSON text sent as a single text frame
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(SessionError::Encode)
    }
}

/// `book.<instrument>.100ms`, instrument substituted verbatim
pub fn book_channel(instrument: &str) -> String {
    format!("book.{instrument}.{BOOK_INTERVAL}")
}
