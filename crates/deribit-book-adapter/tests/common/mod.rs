/*
[INPUT]:  Test scenarios needing an in-process WebSocket or TCP peer
[OUTPUT]: Shared peers, fixtures and event collectors
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for deribit-book-adapter tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use deribit_book_adapter::FeedEvent;
use deribit_book_adapter::session::ws_handshake;
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use serde_json::{Value, json};
use tokio::io::DuplexStream;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::{WebSocketStream, accept_async};

pub const TEST_HOST: &str = "www.deribit.com:443";
pub const TEST_PATH: &str = "/ws/api/v2";
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client and server ends of an upgraded in-memory WebSocket connection
pub async fn ws_pair() -> (WebSocketStream<DuplexStream>, WebSocketStream<DuplexStream>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let server = tokio::spawn(async move { accept_async(server_io).await.expect("server accept") });
    let client = ws_handshake(client_io, TEST_HOST, TEST_PATH, None, TEST_TIMEOUT)
        .await
        .expect("client handshake");
    let server = server.await.expect("server task");
    (client, server)
}

/// An address nothing is listening on
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

/// Book notification shaped like the venue's `subscription` pushes
pub fn book_notification(change_id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "subscription",
        "params": {
            "channel": "book.BTC-PERPETUAL.100ms",
            "data": {
                "type": "change",
                "timestamp": 1_700_000_000_000u64 + change_id,
                "instrument_name": "BTC-PERPETUAL",
                "change_id": change_id,
                "bids": [["new", 64000.5, 1200.0]],
                "asks": [["delete", 64001.0, 0.0]]
            }
        }
    })
}

/// Self-signed certificate for `host` and an acceptor serving it
pub fn self_signed_acceptor(host: &str) -> (CertificateDer<'static>, TlsAcceptor) {
    let certified = rcgen::generate_simple_self_signed(vec![host.to_string()]).expect("certificate");
    let cert = certified.cert.der().clone();
    let key = PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.clone()], key.into())
        .expect("server config");
    (cert, TlsAcceptor::from(Arc::new(config)))
}

/// Client configuration trusting exactly `cert`
pub fn trusting(cert: CertificateDer<'static>) -> Arc<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.add(cert).expect("trust anchor");
    deribit_book_adapter::tls::client_config(roots).expect("client config")
}

pub fn drain(rx: &mut UnboundedReceiver<FeedEvent>) -> Vec<FeedEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
