//! `idoit.*` methods

use super::into_list;
use crate::CmdbClient;
use cmdb_rpc_core::Result;
use serde::Deserialize;
use serde_json::{json, Value};

/// Server version as reported by `idoit.version`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VersionInfo {
    /// Product version, e.g. `1.18`
    pub version: String,
    /// Edition, e.g. `PRO`
    #[serde(rename = "type", default)]
    pub edition: String,
    /// Details about the authenticated user, when present
    #[serde(default)]
    pub login: Option<Value>,
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.edition.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{} {}", self.version, self.edition)
        }
    }
}

/// Server-level methods
#[derive(Debug, Clone)]
pub struct Idoit {
    client: CmdbClient,
}

impl Idoit {
    pub(crate) fn new(client: CmdbClient) -> Self {
        Self { client }
    }

    /// `idoit.version`
    pub async fn version(&self) -> Result<VersionInfo> {
        self.client.request_as("idoit.version", json!({})).await
    }

    /// `idoit.search`: full-text search across objects
    pub async fn search(&self, query: &str) -> Result<Vec<Value>> {
        let value = self.client.request("idoit.search", json!({ "q": query })).await?;
        into_list(value, "idoit.search")
    }

    /// `idoit.constants`: object type, category and relation constants
    pub async fn constants(&self) -> Result<Value> {
        self.client.request("idoit.constants", json!({})).await
    }
}
