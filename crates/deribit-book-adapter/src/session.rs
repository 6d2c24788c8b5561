/*
[INPUT]:  SessionConfig, instrument identifier, FeedSink
[OUTPUT]: One subscribed WebSocket session streaming into the sink until it fails
[POS]:    Session layer - connection lifecycle and receive loop
[UPDATE]: When adding stages or changing timeout / failure policy
*/

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rustls::ClientConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::{WebSocketStream, client_async_with_config};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError, Stage};
use crate::message::decode_message;
use crate::report::report_failure;
use crate::sink::FeedSink;
use crate::state::SessionState;
use crate::subscription::SubscriptionRequest;
use crate::tls;

const RECEIVE_BUFFER_CAPACITY: usize = 64 * 1024;

/// A single order book streaming session.
///
/// `run` consumes the session, so it lives exactly as long as the stage
/// futures borrowing it.
pub struct BookSession<K> {
    config: SessionConfig,
    instrument: String,
    host: String,
    buffer: Vec<u8>,
    sink: K,
    state: SessionState,
    tls_config: Option<Arc<ClientConfig>>,
}

impl<K: FeedSink> BookSession<K> {
    pub fn new(config: SessionConfig, instrument: impl Into<String>, sink: K) -> Self {
        let host = config.host.clone();
        Self {
            config,
            instrument: instrument.into(),
            host,
            buffer: Vec::with_capacity(RECEIVE_BUFFER_CAPACITY),
            sink,
            state: SessionState::Init,
            tls_config: None,
        }
    }

    /// Use a prepared TLS configuration instead of the native trust store
    pub fn with_tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Host value for the upgrade request; gains `:port` once connected
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Drive every stage in order and stream until the session fails.
    ///
    /// The failure is reported before it is returned. Decode failures never
    /// end up here.
    pub async fn run(mut self) -> SessionError {
        let err = match self.drive().await {
            Ok(never) => match never {},
            Err(err) => err,
        };
        self.transition(SessionState::Failed(err.stage()));
        report_failure(&err);
        err
    }

    async fn drive(&mut self) -> Result<Infallible> {
        self.config.validate()?;
        let timeout = self.config.connect_timeout();

        self.transition(SessionState::Resolving);
        let candidates = resolve(&self.config.host, self.config.port).await?;

        self.transition(SessionState::Connecting);
        let (stream, peer) = connect(&candidates, timeout).await?;
        self.host = format!("{}:{}", self.config.host, peer.port());

        self.transition(SessionState::TlsHandshaking);
        let tls_config = match &self.tls_config {
            Some(config) => config.clone(),
            None => tls::client_config(tls::load_native_roots()?)?,
        };
        let stream = tls::handshake(stream, &self.config.host, tls_config, timeout).await?;

        self.transition(SessionState::WsHandshaking);
        let mut ws = ws_handshake(
            stream,
            &self.host,
            &self.config.path,
            self.config.websocket_config(),
            timeout,
        )
        .await?;

        self.transition(SessionState::Subscribing);
        subscribe(&mut ws, &self.instrument).await?;

        self.transition(SessionState::Receiving);
        Err(receive_loop(&mut ws, &mut self.buffer, &mut self.sink).await)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state changed");
        self.state = next;
        self.sink.on_state(next);
    }
}

/// Resolve `host:port` into candidate addresses, in resolver order
pub async fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let endpoint = format!("{host}:{port}");
    let candidates: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| SessionError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?
        .collect();

    info!(endpoint = %endpoint, candidates = candidates.len(), "endpoint resolved");
    Ok(candidates)
}

/// Connect to the first candidate that accepts, bounded by `timeout` for the
/// whole stage
pub async fn connect(
    candidates: &[SocketAddr],
    timeout: Duration,
) -> Result<(TcpStream, SocketAddr)> {
    match tokio::time::timeout(timeout, connect_any(candidates)).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Timeout {
            stage: Stage::Connect,
            after: timeout,
        }),
    }
}

async fn connect_any(candidates: &[SocketAddr]) -> Result<(TcpStream, SocketAddr)> {
    let mut last_failure = None;

    for &addr in candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                if let Err(err) = stream.set_nodelay(true) {
                    debug!(peer = %addr, error = %err, "failed to set TCP_NODELAY");
                }
                info!(peer = %addr, "transport connected");
                return Ok((stream, addr));
            }
            Err(err) => {
                debug!(peer = %addr, error = %err, "connect attempt failed");
                last_failure = Some((addr, err));
            }
        }
    }

    match last_failure {
        Some((addr, source)) => Err(SessionError::Connect {
            endpoint: addr.to_string(),
            source,
        }),
        None => Err(SessionError::NoCandidates),
    }
}

/// HTTP upgrade to `wss://{host}{path}`, bounded by `timeout`; `host` is sent
/// verbatim as the Host header
pub async fn ws_handshake<S>(
    stream: S,
    host: &str,
    path: &str,
    config: Option<WebSocketConfig>,
    timeout: Duration,
) -> Result<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!("wss://{host}{path}")
        .into_client_request()
        .map_err(SessionError::Handshake)?;
    let upgrade = client_async_with_config(request, stream, config);
    let (ws, response) = match tokio::time::timeout(timeout, upgrade).await {
        Ok(result) => result.map_err(SessionError::Handshake)?,
        Err(_) => {
            return Err(SessionError::Timeout {
                stage: Stage::Handshake,
                after: timeout,
            });
        }
    };

    info!(host, path, status = %response.status(), "websocket handshake complete");
    Ok(ws)
}

/// Send the order book subscription as one text frame
pub async fn subscribe<S>(ws: &mut WebSocketStream<S>, instrument: &str) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = SubscriptionRequest::order_book(instrument);
    let text = request.encode()?;
    ws.send(Message::Text(text.into()))
        .await
        .map_err(SessionError::Write)?;

    info!(
        instrument,
        channels = ?request.params.channels,
        "subscription sent"
    );
    Ok(())
}

/// Read one message at a time until the stream fails.
///
/// Each payload is staged in `buffer`, decoded, handed to the sink and then
/// discarded. Decode failures are non-fatal. The returned error is always a
/// read-stage error.
pub async fn receive_loop<S, K>(
    ws: &mut WebSocketStream<S>,
    buffer: &mut Vec<u8>,
    sink: &mut K,
) -> SessionError
where
    S: AsyncRead + AsyncWrite + Unpin,
    K: FeedSink + ?Sized,
{
    loop {
        let message = match ws.next().await {
            Some(Ok(message)) => message,
            Some(Err(err)) => return SessionError::Read(err),
            None => {
                return SessionError::Closed {
                    reason: "stream ended".to_string(),
                };
            }
        };

        match message {
            Message::Text(text) => buffer.extend_from_slice(text.as_str().as_bytes()),
            Message::Binary(bytes) => buffer.extend_from_slice(&bytes),
            Message::Close(frame) => {
                return SessionError::Closed {
                    reason: describe_close(frame.as_ref()),
                };
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }

        dispatch(buffer, sink);
        buffer.clear();
    }
}

fn dispatch<K: FeedSink + ?Sized>(payload: &[u8], sink: &mut K) {
    let raw = String::from_utf8_lossy(payload);
    match decode_message(&raw) {
        Ok(value) => sink.on_message(&value),
        Err(err) => {
            warn!(
                stage = %Stage::Decode,
                error = %err.source,
                bytes = payload.len(),
                "message is not valid JSON"
            );
            sink.on_decode_error(&err);
        }
    }
}

fn describe_close(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if frame.reason.is_empty() => format!("close frame ({})", frame.code),
        Some(frame) => format!("close frame ({}): {}", frame.code, frame.reason),
        None => "close frame".to_string(),
    }
}
