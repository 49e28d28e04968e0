//! `cmdb.dialog.*` methods: drop-down values of category properties

use super::{id_field, into_list};
use crate::batch::BatchRequest;
use crate::CmdbClient;
use cmdb_rpc_core::Result;
use serde_json::{json, Value};

/// Dialog (drop-down) methods
#[derive(Debug, Clone)]
pub struct Dialogs {
    client: CmdbClient,
}

impl Dialogs {
    pub(crate) fn new(client: CmdbClient) -> Self {
        Self { client }
    }

    /// `cmdb.dialog.read`: all values of a dialog property
    pub async fn read(&self, category: &str, property: &str) -> Result<Vec<Value>> {
        let value = self
            .client
            .request(
                "cmdb.dialog.read",
                json!({ "category": category, "property": property }),
            )
            .await?;
        into_list(value, "cmdb.dialog.read")
    }

    /// `cmdb.dialog.create`: add a value; returns its entry id
    ///
    /// `parent` links the value to an entry of a dependent dialog (for
    /// example a model under its manufacturer).
    pub async fn create(
        &self,
        category: &str,
        property: &str,
        value: &str,
        parent: Option<u64>,
    ) -> Result<u64> {
        let result = self
            .client
            .request("cmdb.dialog.create", create_params(category, property, value, parent))
            .await?;
        id_field(&result, "entry_id")
    }

    /// Add several values in one round trip; ids come back in input order
    pub async fn create_many(
        &self,
        category: &str,
        property: &str,
        values: &[&str],
    ) -> Result<Vec<u64>> {
        let mut batch = BatchRequest::new();
        for value in values {
            batch.add("cmdb.dialog.create", create_params(category, property, value, None))?;
        }
        self.client
            .batch(batch)
            .await?
            .into_values()?
            .iter()
            .map(|result| id_field(result, "entry_id"))
            .collect()
    }
}

fn create_params(category: &str, property: &str, value: &str, parent: Option<u64>) -> Value {
    let mut params = json!({
        "category": category,
        "property": property,
        "value": value,
    });
    if let Some(parent) = parent {
        params["parent"] = json!(parent);
    }
    params
}
