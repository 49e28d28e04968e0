//! `cmdb.category.*` methods
//!
//! Categories are addressed by object id plus a category constant such as
//! `C__CATG__CPU`. Multi-value categories hold several entries, each with
//! its own entry id.

use super::{id_field, into_list};
use crate::batch::BatchRequest;
use crate::CmdbClient;
use cmdb_rpc_core::{Params, Result};
use serde_json::{json, Value};

/// Category entry methods
#[derive(Debug, Clone)]
pub struct Categories {
    client: CmdbClient,
}

impl Categories {
    pub(crate) fn new(client: CmdbClient) -> Self {
        Self { client }
    }

    /// `cmdb.category.read`: all entries of `category` on an object
    pub async fn read(&self, object_id: u64, category: &str) -> Result<Vec<Value>> {
        let value = self
            .client
            .request(
                "cmdb.category.read",
                json!({ "objID": object_id, "category": category }),
            )
            .await?;
        into_list(value, "cmdb.category.read")
    }

    /// `cmdb.category.save`: create an entry, or update `entry` when given
    ///
    /// Returns the id of the saved entry.
    pub async fn save(
        &self,
        object_id: u64,
        category: &str,
        data: Params,
        entry: Option<u64>,
    ) -> Result<u64> {
        let mut params = json!({
            "object": object_id,
            "category": category,
            "data": data,
        });
        if let Some(entry) = entry {
            params["entry"] = json!(entry);
        }

        let result = self.client.request("cmdb.category.save", params).await?;
        id_field(&result, "entry")
    }

    /// `cmdb.category.archive`
    pub async fn archive(&self, object_id: u64, category: &str, entry: u64) -> Result<()> {
        self.client
            .request("cmdb.category.archive", entry_params(object_id, category, entry))
            .await?;
        Ok(())
    }

    /// Mark an entry as deleted
    ///
    /// Sends `cmdb.category.archive` twice in one batch. The remote side
    /// has no distinct delete call for entries and this is the sequence
    /// the existing integrations issue; whether a second archive actually
    /// moves an archived entry to deleted is unconfirmed.
    pub async fn delete(&self, object_id: u64, category: &str, entry: u64) -> Result<()> {
        let mut batch = BatchRequest::new();
        for _ in 0..2 {
            batch.add("cmdb.category.archive", entry_params(object_id, category, entry))?;
        }
        self.client.batch(batch).await?.into_values()?;
        Ok(())
    }

    /// `cmdb.category.purge`: remove an entry permanently
    pub async fn purge(&self, object_id: u64, category: &str, entry: u64) -> Result<()> {
        self.client
            .request("cmdb.category.purge", entry_params(object_id, category, entry))
            .await?;
        Ok(())
    }
}

fn entry_params(object_id: u64, category: &str, entry: u64) -> Value {
    json!({
        "object": object_id,
        "category": category,
        "entry": entry,
    })
}
