//! `cmdb.object.*` and `cmdb.objects.*` methods
//!
//! Lifecycle transitions follow the remote state machine: an object is
//! archived, then deleted, then purged. `purge` removes it for good.

use super::{id_field, into_list};
use crate::batch::BatchRequest;
use crate::CmdbClient;
use cmdb_rpc_core::{Params, Result};
use serde_json::{json, Value};

/// Parameters of a `cmdb.object.create` call
#[derive(Debug, Clone, PartialEq)]
pub struct NewObject {
    object_type: String,
    title: String,
    extra: Params,
}

impl NewObject {
    /// Object of `object_type` (a constant like `C__OBJTYPE__SERVER` or a
    /// numeric type id) named `title`
    pub fn new(object_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            title: title.into(),
            extra: Params::new(),
        }
    }

    /// Set an additional attribute (`purpose`, `cmdb_status`, `description`, ...)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn into_params(self) -> Params {
        let mut params = self.extra;
        params.insert("type".into(), Value::String(self.object_type));
        params.insert("title".into(), Value::String(self.title));
        params
    }
}

/// Object methods
#[derive(Debug, Clone)]
pub struct Objects {
    client: CmdbClient,
}

impl Objects {
    pub(crate) fn new(client: CmdbClient) -> Self {
        Self { client }
    }

    /// `cmdb.object.create`; returns the new object id
    pub async fn create(&self, object: NewObject) -> Result<u64> {
        let result = self
            .client
            .request("cmdb.object.create", object.into_params())
            .await?;
        id_field(&result, "id")
    }

    /// Create several objects in one round trip
    ///
    /// Ids come back in input order. The first failed creation is raised;
    /// the others may still have been created server-side.
    pub async fn create_many(&self, objects: Vec<NewObject>) -> Result<Vec<u64>> {
        let mut batch = BatchRequest::new();
        for object in objects {
            batch.add("cmdb.object.create", object.into_params())?;
        }
        self.client
            .batch(batch)
            .await?
            .into_values()?
            .iter()
            .map(|result| id_field(result, "id"))
            .collect()
    }

    /// `cmdb.object.read`
    pub async fn read(&self, id: u64) -> Result<Value> {
        self.client.request("cmdb.object.read", json!({ "id": id })).await
    }

    /// `cmdb.objects.read` with a filter such as `{"type": "C__OBJTYPE__SERVER"}`
    /// or `{"ids": [1, 2, 3]}`
    pub async fn read_many(&self, filter: Value) -> Result<Vec<Value>> {
        let value = self
            .client
            .request("cmdb.objects.read", json!({ "filter": filter }))
            .await?;
        into_list(value, "cmdb.objects.read")
    }

    /// `cmdb.object.update`: change the title or other object-level attributes
    pub async fn update(&self, id: u64, fields: Params) -> Result<()> {
        let mut params = fields;
        params.insert("id".into(), json!(id));
        self.client.request("cmdb.object.update", params).await?;
        Ok(())
    }

    /// `cmdb.object.archive`
    pub async fn archive(&self, id: u64) -> Result<()> {
        self.transition("cmdb.object.archive", id).await
    }

    /// `cmdb.object.delete`: mark as deleted
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.transition("cmdb.object.delete", id).await
    }

    /// `cmdb.object.purge`: remove permanently
    pub async fn purge(&self, id: u64) -> Result<()> {
        self.transition("cmdb.object.purge", id).await
    }

    async fn transition(&self, method: &str, id: u64) -> Result<()> {
        self.client.request(method, json!({ "object": id })).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_with, echo_results, ScriptedTransport};
    use cmdb_rpc_core::Error;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_merges_attributes() {
        let transport = ScriptedTransport::new(echo_results(|_, _| {
            json!({"id": 1234, "message": "Object was successfully created", "success": true})
        }));
        let client = client_with(transport.clone());

        let object = NewObject::new("C__OBJTYPE__SERVER", "web01").with("purpose", "production");
        let id = client.objects().create(object).await.unwrap();
        assert_eq!(id, 1234);

        let params = &transport.sent()[0]["params"];
        assert_eq!(params["type"], "C__OBJTYPE__SERVER");
        assert_eq!(params["title"], "web01");
        assert_eq!(params["purpose"], "production");
        assert_eq!(params["apikey"], "test-key");
    }

    #[tokio::test]
    async fn test_create_raises_unsuccessful_marker() {
        let transport = ScriptedTransport::new(echo_results(|_, _| {
            json!({"success": false, "message": "Object type does not exist"})
        }));
        let client = client_with(transport);

        match client.objects().create(NewObject::new("C__OBJTYPE__NOPE", "x")).await {
            Err(Error::Application { code, message, .. }) => {
                assert_eq!(code, None);
                assert_eq!(message, "Object type does not exist");
            }
            other => panic!("Expected Application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_many_uses_one_round_trip() {
        let next = Arc::new(AtomicU64::new(500));
        let counter = next.clone();
        let transport = ScriptedTransport::new(echo_results(move |_, _| {
            json!({"id": counter.fetch_add(1, Ordering::SeqCst), "success": true})
        }));
        let client = client_with(transport.clone());

        let ids = client
            .objects()
            .create_many(vec![
                NewObject::new("C__OBJTYPE__SERVER", "a"),
                NewObject::new("C__OBJTYPE__SERVER", "b"),
                NewObject::new("C__OBJTYPE__SERVER", "c"),
            ])
            .await
            .unwrap();

        assert_eq!(ids, vec![500, 501, 502]);
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_lifecycle_methods() {
        let transport = ScriptedTransport::new(echo_results(|_, _| {
            json!({"success": true, "message": "ok"})
        }));
        let client = client_with(transport.clone());
        let objects = client.objects();

        objects.archive(7).await.unwrap();
        objects.delete(7).await.unwrap();
        objects.purge(7).await.unwrap();

        let methods: Vec<Value> = transport.sent().iter().map(|r| r["method"].clone()).collect();
        assert_eq!(
            methods,
            vec![
                json!("cmdb.object.archive"),
                json!("cmdb.object.delete"),
                json!("cmdb.object.purge"),
            ]
        );
        assert_eq!(transport.sent()[2]["params"]["object"], 7);
    }

    #[tokio::test]
    async fn test_read_many_wraps_filter() {
        let transport = ScriptedTransport::new(echo_results(|_, _| {
            json!([{"id": "1", "title": "a"}, {"id": "2", "title": "b"}])
        }));
        let client = client_with(transport.clone());

        let objects = client.objects().read_many(json!({"ids": [1, 2]})).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(transport.sent()[0]["params"]["filter"]["ids"], json!([1, 2]));
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let transport = ScriptedTransport::new(echo_results(|_, _| json!({"success": true})));
        let client = client_with(transport.clone());

        let mut fields = Params::new();
        fields.insert("title".into(), json!("web02"));
        client.objects().update(9, fields).await.unwrap();

        let params = &transport.sent()[0]["params"];
        assert_eq!(params["id"], 9);
        assert_eq!(params["title"], "web02");
    }
}
