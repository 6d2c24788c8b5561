/*
[INPUT]:  Failures from every session stage (DNS, TCP, TLS, WebSocket, JSON)
[OUTPUT]: Structured error types tagged with the failing stage
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding a session stage or a new failure source
*/

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Session stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Resolve,
    Connect,
    SslHandshake,
    Handshake,
    Write,
    Read,
    Decode,
}

impl Stage {
    /// Short diagnostic tag printed next to the cause.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Config => "config",
            Stage::Resolve => "resolve",
            Stage::Connect => "connect",
            Stage::SslHandshake => "ssl_handshake",
            Stage::Handshake => "handshake",
            Stage::Write => "write",
            Stage::Read => "read",
            Stage::Decode => "decode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload that did not parse as JSON. The raw text is kept verbatim.
#[derive(Error, Debug)]
#[error("Failed to parse JSON: {source}")]
pub struct DecodeError {
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// Main error type for the order book session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session configuration rejected before any I/O
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Name resolution failed
    #[error("Failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Resolver succeeded but produced nothing to connect to
    #[error("No candidate addresses to connect to")]
    NoCandidates,

    /// Every candidate address refused or failed
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Connect or TLS stage exceeded its bound
    #[error("{stage} timed out after {}s", .after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    /// TLS client could not be configured (roots, protocol versions, server name)
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// TLS handshake or certificate verification failed
    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    /// HTTP upgrade was refused or malformed
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    /// Subscription could not be serialized
    #[error("Failed to encode subscription: {0}")]
    Encode(#[source] serde_json::Error),

    /// Subscription frame could not be written
    #[error("WebSocket write failed: {0}")]
    Write(#[source] tungstenite::Error),

    /// Transport or protocol failure while waiting for a message
    #[error("WebSocket read failed: {0}")]
    Read(#[source] tungstenite::Error),

    /// Peer sent a close frame or the stream ended
    #[error("Connection closed by peer: {reason}")]
    Closed { reason: String },

    /// Incoming payload was not JSON
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SessionError {
    /// Stage this error terminates (or, for decode failures, interrupts).
    pub fn stage(&self) -> Stage {
        match self {
            SessionError::Config(_) => Stage::Config,
            SessionError::Resolve { .. } => Stage::Resolve,
            SessionError::NoCandidates | SessionError::Connect { .. } => Stage::Connect,
            SessionError::Timeout { stage, .. } => *stage,
            SessionError::TlsConfig(_) | SessionError::Tls(_) => Stage::SslHandshake,
            SessionError::Handshake(_) => Stage::Handshake,
            SessionError::Encode(_) | SessionError::Write(_) => Stage::Write,
            SessionError::Read(_) | SessionError::Closed { .. } => Stage::Read,
            SessionError::Decode(_) => Stage::Decode,
        }
    }

    /// Check if the error ends the session. Only decode failures are survivable.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SessionError::Decode(_))
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
