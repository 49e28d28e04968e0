//! CMDB client handle
//!
//! `CmdbClient` is the entry point applications hold on to. It wraps a
//! [`BatchEngine`] and hands out the namespace wrappers (`objects()`,
//! `categories()`, ...) that shape parameters for individual API methods.
//!
//! # Cloning
//!
//! `CmdbClient` is cheaply cloneable using `Arc` internally. All clones
//! share the same engine, so ids stay unique across every clone and task.

use crate::batch::{BatchRequest, BatchResponse};
use crate::client_builder::ClientBuilder;
use crate::engine::BatchEngine;
use crate::namespaces::{Categories, Dialogs, Idoit, Locations, Objects};
use cmdb_rpc_core::{Call, Error, ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// JSON-RPC client for a CMDB endpoint
#[derive(Clone)]
pub struct CmdbClient {
    engine: Arc<BatchEngine>,
}

impl CmdbClient {
    /// Wrap an already configured engine
    pub fn new(engine: BatchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Start configuring a client for `url`
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// The engine every call goes through
    pub fn engine(&self) -> &BatchEngine {
        &self.engine
    }

    /// Send one call and return its raw result value
    ///
    /// `params` must serialize to a JSON object (or `null`).
    pub async fn request<P>(&self, method: impl Into<String>, params: P) -> Result<Value>
    where
        P: Serialize,
    {
        let (method, params) = Call::from_serialize(method, params)?.into_parts();
        self.engine.request(method, params).await
    }

    /// Send one call and deserialize its result
    pub async fn request_as<P, R>(&self, method: impl Into<String>, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let method = method.into();
        let value = self.request(method.clone(), params).await?;
        serde_json::from_value(value).map_err(|e| {
            Error::from(ProtocolError::UnexpectedShape(format!("{}: {}", method, e)))
        })
    }

    /// Send `calls` in one round trip
    pub async fn batch_request(&self, calls: Vec<Call>) -> Result<BatchResponse> {
        self.engine.batch_request(calls).await
    }

    /// Send a prepared [`BatchRequest`] in one round trip
    pub async fn batch(&self, batch: BatchRequest) -> Result<BatchResponse> {
        self.engine.batch_request(batch.into_calls()).await
    }

    /// `idoit.*` methods
    pub fn idoit(&self) -> Idoit {
        Idoit::new(self.clone())
    }

    /// `cmdb.object.*` and `cmdb.objects.*` methods
    pub fn objects(&self) -> Objects {
        Objects::new(self.clone())
    }

    /// `cmdb.category.*` methods
    pub fn categories(&self) -> Categories {
        Categories::new(self.clone())
    }

    /// `cmdb.dialog.*` methods
    pub fn dialogs(&self) -> Dialogs {
        Dialogs::new(self.clone())
    }

    /// `cmdb.location_tree.*` methods
    pub fn locations(&self) -> Locations {
        Locations::new(self.clone())
    }
}

impl std::fmt::Debug for CmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdbClient")
            .field("next_id", &self.engine.next_id_hint())
            .finish()
    }
}
