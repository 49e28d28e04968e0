//! Transport collaborator
//!
//! The batch engine hands a fully encoded JSON document to a [`Transport`]
//! and gets the raw reply bytes back. It never looks at HTTP status codes,
//! headers or timeouts itself; all of that is the transport's business and
//! surfaces as [`TransportError`].
//!
//! [`HttpTransport`] is the default implementation: one `POST` per round
//! trip through a shared `reqwest::Client`.

use async_trait::async_trait;
use cmdb_rpc_core::{Error, Result, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use url::Url;

/// Default per-request deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one encoded JSON-RPC document and returns the reply body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip
    ///
    /// Implementations must report timeouts and cancellation as errors
    /// rather than returning an empty body.
    async fn send(&self, body: Vec<u8>) -> std::result::Result<Vec<u8>, TransportError>;
}

/// JSON-over-HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Transport with the default timeout and no extra headers
    pub fn new(endpoint: Url) -> Result<Self> {
        Self::with_config(endpoint, DEFAULT_TIMEOUT, HeaderMap::new())
    }

    /// Transport with a custom timeout and additional request headers
    pub fn with_config(endpoint: Url, timeout: Duration, headers: HeaderMap) -> Result<Self> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported endpoint scheme: {}",
                    other
                )))
            }
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// The URL every request is posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, body), fields(endpoint = %self.endpoint, bytes = body.len()))]
    async fn send(&self, body: Vec<u8>) -> std::result::Result<Vec<u8>, TransportError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".into());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(from_reqwest)?;
        tracing::trace!(status = status.as_u16(), bytes = bytes.len(), "HTTP reply received");
        Ok(bytes.to_vec())
    }
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err.to_string())
    }
}

/// Parse `name: value` header pairs into a header map
pub fn parse_headers<'a, I>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidArgument(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidArgument(format!("invalid value for {}: {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_keeps_endpoint() {
        let url = Url::parse("https://cmdb.example.com/src/jsonrpc.php").unwrap();
        let transport = HttpTransport::new(url.clone()).unwrap();
        assert_eq!(transport.endpoint(), &url);
    }

    #[test]
    fn test_http_transport_rejects_other_schemes() {
        let url = Url::parse("ws://cmdb.example.com/rpc").unwrap();
        assert!(matches!(
            HttpTransport::new(url),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers([("X-RPC-Auth-Session", "abc123"), ("X-Tenant", "7")]).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-rpc-auth-session"], "abc123");
    }

    #[test]
    fn test_parse_headers_rejects_invalid_name() {
        assert!(parse_headers([("bad header", "x")]).is_err());
    }
}
