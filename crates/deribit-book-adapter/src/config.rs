/*
[INPUT]:  Venue endpoint settings (host, port, resource path, timeouts)
[OUTPUT]: Validated SessionConfig ready for a session
[POS]:    Configuration layer - connection parameters
[UPDATE]: When adding connection options or changing defaults
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::error::{Result, SessionError};

/// Public production host
pub const MAINNET_HOST: &str = "www.deribit.com";
/// Public test host
pub const TESTNET_HOST: &str = "test.deribit.com";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_PATH: &str = "/ws/api/v2";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Connection parameters for one streaming session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// WebSocket resource path used in the upgrade request
    pub path: String,
    /// Bound applied separately to the connect and the TLS handshake stages
    pub connect_timeout_secs: u64,
    /// Largest accepted WebSocket message; `None` keeps the protocol default
    pub max_message_size: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: MAINNET_HOST.to_string(),
            port: DEFAULT_PORT,
            path: DEFAULT_PATH.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_message_size: None,
        }
    }
}

impl SessionConfig {
    /// Defaults pointed at the public test venue
    pub fn testnet() -> Self {
        Self {
            host: TESTNET_HOST.to_string(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn websocket_config(&self) -> Option<WebSocketConfig> {
        self.max_message_size.map(|limit| {
            WebSocketConfig::default()
                .max_message_size(Some(limit))
                .max_frame_size(Some(limit))
        })
    }

    /// Reject settings that could never produce a session
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(SessionError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(SessionError::Config("port must be non-zero".to_string()));
        }
        if !self.path.starts_with('/') {
            return Err(SessionError::Config(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        if self.connect_timeout_secs == 0 {
            return Err(SessionError::Config(
                "connect_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == Some(0) {
            return Err(SessionError::Config(
                "max_message_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
