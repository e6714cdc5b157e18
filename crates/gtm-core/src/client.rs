//! HTTP client utilities.
//!
//! This module builds the `reqwest` client used for every management call and
//! assembles requests carrying the standard JSON and token headers.

use crate::types::{GtmEndpoint, AUTH_TOKEN_HEADER};
use crate::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, Request};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("gtm-core/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP client configuration.
///
/// No timeout is applied unless one is set; requests otherwise wait as long as
/// the transport allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Option<Duration>,

    /// Accept any server certificate, including self-signed ones
    pub accept_invalid_certs: bool,

    /// User agent header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: None,
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Skip TLS certificate validation. The device's certificate is trusted
    /// whatever it is.
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the HTTP client used for management calls.
///
/// # Errors
///
/// Returns [`Error::ConfigError`] if the TLS backend cannot be initialised.
pub fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new().user_agent(config.user_agent.as_str());

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    if config.accept_invalid_certs {
        warn!("TLS certificate verification disabled for GTM client");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|err| Error::ConfigError(format!("Failed to build GTM HTTP client: {err}")))
}

/// Resolve an endpoint against the device host.
///
/// The endpoint path is appended to the host verbatim, so a host carrying a
/// path prefix keeps it.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if the result is not a valid URL.
pub fn endpoint_url(host: &str, endpoint: GtmEndpoint) -> Result<Url> {
    let url = format!("{}{}", host.trim_end_matches('/'), endpoint.path());
    Url::parse(&url)
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid GTM URL `{url}`: {err}")))
}

/// Build a management request.
///
/// The body, when present, is serialized to JSON. `Content-Type` and `Accept`
/// are always `application/json`; the token header is attached when a token
/// is given.
///
/// # Errors
///
/// Returns [`Error::SerializationError`] if the body cannot be serialized, or a
/// transport error if the request cannot be assembled.
pub fn build_request<B>(
    http: &Client,
    method: Method,
    url: Url,
    token: Option<&str>,
    body: Option<&B>,
) -> Result<Request>
where
    B: Serialize + ?Sized,
{
    let mut request = http
        .request(method, url)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(ACCEPT, JSON_CONTENT_TYPE);

    if let Some(token) = token {
        request = request.header(AUTH_TOKEN_HEADER, token);
    }

    if let Some(payload) = body {
        let bytes = serde_json::to_vec(payload)
            .map_err(|err| Error::SerializationError(err.to_string()))?;
        debug!(bytes = bytes.len(), "Serialized GTM request body");
        request = request.body(bytes);
    }

    request.build().map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new();
        assert!(config.timeout.is_none());
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("custom/1.0")
            .danger_accept_invalid_certs(true);

        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.user_agent, "custom/1.0");
        assert!(config.accept_invalid_certs);
    }

    /// Serve a fixed `200 ok` over HTTPS with a freshly generated self-signed
    /// certificate for `localhost`. Returns the port.
    async fn serve_self_signed_https() -> u16 {
        use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
        use rustls::ServerConfig;
        use std::sync::Arc;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio_rustls::TlsAcceptor;

        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
            certified.key_pair.serialize_der(),
        ));
        let tls = ServerConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(tls));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    // a client that rejects the certificate aborts the handshake
                    let Ok(mut stream) = acceptor.accept(stream).await else {
                        return;
                    };
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                        )
                        .await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        port
    }

    #[tokio::test]
    async fn test_self_signed_certificate_rejected_by_default() {
        let port = serve_self_signed_https().await;
        let http = build_http_client(&ClientConfig::new().with_timeout(Duration::from_secs(10)))
            .unwrap();

        let result = http
            .get(format!("https://localhost:{port}/mgmt/tm/gtm/server"))
            .send()
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_self_signed_certificate_accepted_when_verification_disabled() {
        let port = serve_self_signed_https().await;
        let http = build_http_client(
            &ClientConfig::new()
                .with_timeout(Duration::from_secs(10))
                .danger_accept_invalid_certs(true),
        )
        .unwrap();

        let response = http
            .get(format!("https://localhost:{port}/mgmt/tm/gtm/server"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[test]
    fn test_endpoint_url() {
        let url = endpoint_url("https://hostname", GtmEndpoint::PoolsA).unwrap();
        assert_eq!(url.as_str(), "https://hostname/mgmt/tm/gtm/pool/a");

        let url = endpoint_url("https://hostname/", GtmEndpoint::Login).unwrap();
        assert_eq!(url.as_str(), "https://hostname/mgmt/shared/authn/login");

        let url = endpoint_url("https://proxy.local/bigip", GtmEndpoint::Servers).unwrap();
        assert_eq!(url.as_str(), "https://proxy.local/bigip/mgmt/tm/gtm/server");
    }

    #[test]
    fn test_endpoint_url_invalid_host() {
        let err = endpoint_url("hostname", GtmEndpoint::Servers).unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_build_request_headers_and_body() {
        let http = build_http_client(&ClientConfig::new()).unwrap();
        let url = endpoint_url("https://hostname", GtmEndpoint::WideIpsA).unwrap();
        let body = json!({"name": "demo.com", "ttl": 30});

        let request =
            build_request(&http, Method::POST, url, Some("abc123"), Some(&body)).unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), "/mgmt/tm/gtm/wideip/a");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert_eq!(request.headers()[AUTH_TOKEN_HEADER], "abc123");

        let bytes = request.body().and_then(reqwest::Body::as_bytes).unwrap();
        let sent: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn test_build_request_without_token_or_body() {
        let http = build_http_client(&ClientConfig::new()).unwrap();
        let url = endpoint_url("https://hostname", GtmEndpoint::Servers).unwrap();

        let request = build_request::<Value>(&http, Method::GET, url, None, None).unwrap();

        assert!(request.headers().get(AUTH_TOKEN_HEADER).is_none());
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert!(request.body().is_none());
    }

    #[tokio::test]
    async fn test_request_reaches_server_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mgmt/tm/gtm/server"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(header(AUTH_TOKEN_HEADER, "tok"))
            .and(body_json(json!({"name": "server_1.1.2.1"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let http = build_http_client(&ClientConfig::new()).unwrap();
        let url = endpoint_url(&server.uri(), GtmEndpoint::Servers).unwrap();
        let body = json!({"name": "server_1.1.2.1"});
        let request = build_request(&http, Method::POST, url, Some("tok"), Some(&body)).unwrap();

        let response = http.execute(request).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_service_unavailable() {
        let http = build_http_client(&ClientConfig::new()).unwrap();
        // port 1 on loopback is not listening
        let url = endpoint_url("http://127.0.0.1:1", GtmEndpoint::Servers).unwrap();
        let request = build_request::<Value>(&http, Method::GET, url, None, None).unwrap();

        let err = Error::from(http.execute(request).await.unwrap_err());
        assert!(err.is_transport());
    }
}
