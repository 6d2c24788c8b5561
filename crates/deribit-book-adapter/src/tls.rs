/*
[INPUT]:  Connected TCP stream, server host name, trust roots
[OUTPUT]: Client-side TLS stream (TLS 1.2 or newer, peer verified)
[POS]:    Transport layer - encryption upgrade
[UPDATE]: When changing trust roots, protocol floor or crypto provider
*/

use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError, Stage};

/// Trust anchors from the operating system certificate store
pub fn load_native_roots() -> Result<RootCertStore> {
    let loaded = rustls_native_certs::load_native_certs();
    for err in &loaded.errors {
        warn!(error = %err, "failed to load native certificate");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
    debug!(added, ignored, "native root certificates loaded");

    if roots.is_empty() {
        return Err(SessionError::TlsConfig(
            "no trusted root certificates found".to_string(),
        ));
    }
    Ok(roots)
}

/// Client configuration restricted to TLS 1.3 and TLS 1.2
pub fn client_config(roots: RootCertStore) -> Result<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])
        .map_err(|err| SessionError::TlsConfig(err.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Perform the client handshake, bounded by `timeout`
pub async fn handshake<S>(
    stream: S,
    host: &str,
    config: Arc<ClientConfig>,
    timeout: Duration,
) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = server_name(host)?;
    let connector = TlsConnector::from(config);

    match tokio::time::timeout(timeout, connector.connect(server_name, stream)).await {
        Ok(Ok(stream)) => {
            let (_, session) = stream.get_ref();
            info!(
                host,
                version = ?session.protocol_version(),
                "tls handshake complete"
            );
            Ok(stream)
        }
        Ok(Err(err)) => Err(SessionError::Tls(err)),
        Err(_) => Err(SessionError::Timeout {
            stage: Stage::SslHandshake,
            after: timeout,
        }),
    }
}

fn server_name(host: &str) -> Result<ServerName<'static>> {
    // rustls expects IPv6 literals without brackets
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_string())
        .map_err(|err| SessionError::TlsConfig(format!("invalid server name {host}: {err}")))
}
