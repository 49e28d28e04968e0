//! `cmdb.location_tree.*` methods

use super::{id_field, into_list};
use crate::batch::BatchRequest;
use crate::CmdbClient;
use cmdb_rpc_core::Result;
use serde_json::{json, Value};
use std::collections::HashSet;

/// One node found by a recursive location tree walk
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntry {
    /// Object id of the node
    pub id: u64,
    /// Object id of the location it sits in
    pub parent: u64,
    /// Distance from the start of the walk; direct children have depth 1
    pub depth: usize,
    /// The node as returned by the server
    pub node: Value,
}

/// Location tree methods
#[derive(Debug, Clone)]
pub struct Locations {
    client: CmdbClient,
}

impl Locations {
    pub(crate) fn new(client: CmdbClient) -> Self {
        Self { client }
    }

    /// `cmdb.location_tree.read`: direct children of location `id`
    pub async fn read_tree(&self, id: u64) -> Result<Vec<Value>> {
        let value = self
            .client
            .request("cmdb.location_tree.read", json!({ "id": id }))
            .await?;
        into_list(value, "cmdb.location_tree.read")
    }

    /// Walk the tree below `root` breadth-first
    ///
    /// Every level is fetched with one batch. `max_depth` limits how many
    /// levels are read; `None` walks to the leaves. Nodes already seen are
    /// not expanded again.
    pub async fn read_tree_recursive(
        &self,
        root: u64,
        max_depth: Option<usize>,
    ) -> Result<Vec<LocationEntry>> {
        let mut entries = Vec::new();
        let mut seen: HashSet<u64> = HashSet::from([root]);
        let mut frontier = vec![root];
        let mut depth = 0;

        while !frontier.is_empty() && max_depth.map_or(true, |max| depth < max) {
            depth += 1;

            let mut batch = BatchRequest::new();
            for parent in &frontier {
                batch.add("cmdb.location_tree.read", json!({ "id": parent }))?;
            }
            let levels = self.client.batch(batch).await?.into_values()?;

            let mut next = Vec::new();
            for (parent, children) in frontier.iter().zip(levels) {
                for node in into_list(children, "cmdb.location_tree.read")? {
                    let id = id_field(&node, "id")?;
                    if !seen.insert(id) {
                        continue;
                    }
                    next.push(id);
                    entries.push(LocationEntry {
                        id,
                        parent: *parent,
                        depth,
                        node,
                    });
                }
            }

            tracing::debug!(depth, found = next.len(), "Location level read");
            frontier = next;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{client_with, echo_results, ScriptedTransport};

    // 1 -> 2, 3 ; 2 -> 4 ; 4 -> 1 (loop back to the root)
    fn tree(_: &str, params: &Value) -> Value {
        match params["id"].as_u64().unwrap() {
            1 => json!([{"id": "2", "title": "Building A"}, {"id": "3", "title": "Building B"}]),
            2 => json!([{"id": "4", "title": "Room 101"}]),
            4 => json!([{"id": "1", "title": "Root"}]),
            _ => json!([]),
        }
    }

    #[tokio::test]
    async fn test_read_tree() {
        let transport = ScriptedTransport::new(echo_results(tree));
        let client = client_with(transport.clone());

        let children = client.locations().read_tree(1).await.unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(transport.sent()[0]["method"], "cmdb.location_tree.read");
    }

    #[tokio::test]
    async fn test_recursive_walk_batches_each_level() {
        let transport = ScriptedTransport::new(echo_results(tree));
        let client = client_with(transport.clone());

        let entries = client.locations().read_tree_recursive(1, None).await.unwrap();

        let found: Vec<(u64, u64, usize)> =
            entries.iter().map(|e| (e.id, e.parent, e.depth)).collect();
        assert_eq!(found, vec![(2, 1, 1), (3, 1, 1), (4, 2, 2)]);
        assert_eq!(entries[2].node["title"], "Room 101");

        // Levels: [1], [2, 3], [4]
        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recursive_walk_respects_max_depth() {
        let transport = ScriptedTransport::new(echo_results(tree));
        let client = client_with(transport.clone());

        let entries = client.locations().read_tree_recursive(1, Some(1)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(transport.sent().len(), 1);
    }
}
