//! Client builder
//!
//! The `ClientBuilder` provides a fluent API for configuring a
//! [`CmdbClient`] before first use. It allows you to:
//! - Point at an endpoint and set session parameters (api key, language)
//! - Tune the HTTP transport (timeout, extra headers) or replace it
//! - Configure observability (OpenTelemetry) and the service name
//!
//! # Environment
//!
//! [`ClientBuilder::from_env`] reads:
//!
//! | Variable                 | Meaning                          |
//! |--------------------------|----------------------------------|
//! | `CMDB_RPC_URL`           | endpoint URL (required)          |
//! | `CMDB_RPC_API_KEY`       | value of the `apikey` param      |
//! | `CMDB_RPC_LANGUAGE`      | value of the `language` param    |
//! | `CMDB_RPC_TIMEOUT_SECS`  | per-request timeout in seconds   |
//!
//! # Examples
//!
//! ```rust,no_run
//! use cmdb_rpc_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> cmdb_rpc_core::Result<()> {
//! let client = ClientBuilder::new("https://cmdb.example.com/src/jsonrpc.php")
//!     .api_key("c1ia5q")
//!     .language("en")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! // With observability
//! let traced = ClientBuilder::from_env()?
//!     .with_default_observability()
//!     .service_name("inventory-sync")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::engine::BatchEngine;
use crate::metrics::ClientMetrics;
use crate::transport::{parse_headers, HttpTransport, Transport, DEFAULT_TIMEOUT};
use crate::CmdbClient;
use cmdb_rpc_core::{Error, IdSequence, ObservabilityConfig, Result, Session};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Endpoint URL variable
pub const ENV_URL: &str = "CMDB_RPC_URL";
/// API key variable
pub const ENV_API_KEY: &str = "CMDB_RPC_API_KEY";
/// Language variable
pub const ENV_LANGUAGE: &str = "CMDB_RPC_LANGUAGE";
/// Timeout variable, in whole seconds
pub const ENV_TIMEOUT_SECS: &str = "CMDB_RPC_TIMEOUT_SECS";

/// Builder for configuring and creating a [`CmdbClient`]
pub struct ClientBuilder {
    url: String,
    api_key: Option<String>,
    language: Option<String>,
    timeout: Duration,
    headers: Vec<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    first_id: Option<u64>,
    metrics: Option<Arc<ClientMetrics>>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a new client builder for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            language: None,
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            transport: None,
            first_id: None,
            metrics: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Create a builder from `CMDB_RPC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::InvalidArgument(format!("{} is not set", ENV_URL)))?;

        let mut builder = Self::new(url);
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            builder = builder.api_key(key);
        }
        if let Some(language) = lookup(ENV_LANGUAGE).filter(|v| !v.is_empty()) {
            builder = builder.language(language);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::InvalidArgument(format!(
                    "{} must be a whole number, got {:?}",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    /// Send `apikey` with every call
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Send `language` with every call
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Per-request timeout of the HTTP transport
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add an HTTP header to every request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Use a custom transport instead of HTTP
    ///
    /// The URL, timeout and headers are ignored when a transport is set.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Start the id sequence at `first` instead of 1
    pub fn first_id(mut self, first: u64) -> Self {
        self.first_id = Some(first);
        self
    }

    /// Record engine metrics through `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    fn session(&self) -> Session {
        let mut session = Session::new();
        if let Some(ref key) = self.api_key {
            session = session.with_api_key(key.clone());
        }
        if let Some(ref language) = self.language {
            session = session.with_language(language.clone());
        }
        session
    }

    fn http_transport(&self) -> Result<HttpTransport> {
        let endpoint = Url::parse(&self.url).map_err(|e| {
            Error::InvalidArgument(format!("invalid endpoint {:?}: {}", self.url, e))
        })?;
        let headers = parse_headers(self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str())))?;
        HttpTransport::with_config(endpoint, self.timeout, headers)
    }

    /// Build the client
    pub fn build(self) -> Result<CmdbClient> {
        let session = self.session();

        let transport: Arc<dyn Transport> = match self.transport {
            Some(ref transport) => transport.clone(),
            None => Arc::new(self.http_transport()?),
        };

        let metrics = match self.observability_config {
            Some(mut config) => {
                if let Some(name) = self.service_name {
                    config.service_name = name;
                }

                cmdb_rpc_core::init_observability(config.clone()).map_err(|e| {
                    Error::InvalidArgument(format!("Failed to initialize observability: {}", e))
                })?;

                Some(
                    self.metrics
                        .unwrap_or_else(|| Arc::new(ClientMetrics::new(config.service_name))),
                )
            }
            None => self.metrics,
        };

        let ids = self.first_id.map_or_else(IdSequence::new, IdSequence::starting_at);
        let mut engine = BatchEngine::with_ids(transport, session, ids);
        if let Some(metrics) = metrics {
            engine = engine.with_metrics(metrics);
        }

        tracing::debug!(endpoint = %self.url, "CMDB client ready");
        Ok(CmdbClient::new(engine))
    }
}
