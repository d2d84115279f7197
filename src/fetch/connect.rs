//! Raw TCP and TLS connection probing.
//!
//! reqwest doesn't expose connect or handshake timings, so these are taken
//! from a separate connection to the first resolved address, opened only
//! after the check's own request has succeeded. The same TCP connect backs
//! the TCP check path.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error_handling::{FailureKind, ProbeError, TimeoutPhase};
use crate::utils::duration_to_ms;

/// Sub-phase timings of one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectTiming {
    pub tcp_connect: Duration,
    pub tls_handshake: Option<Duration>,
}

/// Opens a TCP connection to `host:port`, failing if it takes longer than `limit`.
///
/// `host` may be an IP literal or a name; name resolution counts against the
/// limit. On timeout the pending connect future is dropped, which closes the
/// socket.
pub async fn tcp_connect(
    host: &str,
    port: u16,
    limit: Duration,
) -> Result<(TcpStream, Duration), ProbeError> {
    let start = Instant::now();
    match tokio::time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Ok((stream, start.elapsed())),
        Ok(Err(e)) => Err(ProbeError::Network {
            kind: FailureKind::Connect,
            message: format!("connect to {host}:{port} failed: {e}"),
        }),
        Err(_) => Err(ProbeError::Timeout {
            phase: TimeoutPhase::Connect,
            limit_ms: duration_to_ms(limit),
        }),
    }
}

fn tls_client_config() -> Result<ClientConfig, ProbeError> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ProbeError::Network {
        kind: FailureKind::Tls,
        message: format!("TLS configuration error: {e}"),
    })?
    .with_root_certificates(root_store)
    .with_no_client_auth();
    Ok(config)
}

/// Measures TCP connect time to `ip:port` and, when `tls_server_name` is
/// given, the TLS handshake time on top of it. Both phases together must
/// finish within `limit`.
pub async fn probe_connection(
    ip: IpAddr,
    port: u16,
    tls_server_name: Option<&str>,
    limit: Duration,
) -> Result<ConnectTiming, ProbeError> {
    let (stream, tcp_connect) = tcp_connect(&ip.to_string(), port, limit).await?;

    let Some(host) = tls_server_name else {
        return Ok(ConnectTiming {
            tcp_connect,
            tls_handshake: None,
        });
    };

    let server_name = ServerName::try_from(host.to_string()).map_err(|e| ProbeError::Network {
        kind: FailureKind::Tls,
        message: format!("invalid TLS server name {host}: {e}"),
    })?;
    let connector = TlsConnector::from(Arc::new(tls_client_config()?));

    let handshake_limit = limit.saturating_sub(tcp_connect);
    let start = Instant::now();
    match tokio::time::timeout(handshake_limit, connector.connect(server_name, stream)).await {
        Ok(Ok(_tls)) => Ok(ConnectTiming {
            tcp_connect,
            tls_handshake: Some(start.elapsed()),
        }),
        Ok(Err(e)) => Err(ProbeError::Network {
            kind: FailureKind::Tls,
            message: format!("TLS handshake with {host} failed: {e}"),
        }),
        Err(_) => Err(ProbeError::Timeout {
            phase: TimeoutPhase::Connect,
            limit_ms: duration_to_ms(limit),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_connect_to_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (_stream, elapsed) = tcp_connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_tcp_connect_refused() {
        // Bind then drop to get a port with nothing listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = tcp_connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Network {
                kind: FailureKind::Connect,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_plain_probe_has_no_tls_phase() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let timing = probe_connection(
            addr.ip(),
            addr.port(),
            None,
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert!(timing.tls_handshake.is_none());
    }
}
