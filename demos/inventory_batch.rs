//! Inventory snapshot example
//!
//! Reads every server object, then fetches their CPU and memory entries in
//! a single batch and prints a short report. Spans and metrics go to an OTLP
//! collector when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//!
//! Run with:
//!   CMDB_RPC_URL=https://cmdb.example.com/src/jsonrpc.php \
//!   CMDB_RPC_API_KEY=... cargo run --example inventory_batch

use cmdb_rpc::client::BatchRequest;
use cmdb_rpc::core::{shutdown_observability, ObservabilityConfig};
use cmdb_rpc::{ClientBuilder, CmdbClient};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ObjectSummary {
    // Sent as a number or a numeric string depending on the server version
    id: serde_json::Value,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = ClientBuilder::from_env()?;
    if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        let config = ObservabilityConfig::new("inventory-batch")
            .with_log_level("cmdb_rpc_client=debug,info");
        builder = builder.with_observability(config);
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("cmdb_rpc_client=debug,info")
            .init();
    }
    let client = builder.build()?;

    let result = report(&client).await;
    shutdown_observability();
    result
}

async fn report(client: &CmdbClient) -> Result<(), Box<dyn std::error::Error>> {
    let version = client.idoit().version().await?;
    println!("Connected to {}", version);

    let servers: Vec<ObjectSummary> = client
        .objects()
        .read_many(json!({ "type": "C__OBJTYPE__SERVER" }))
        .await?
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<_, _>>()?;
    println!("{} servers", servers.len());

    if servers.is_empty() {
        return Ok(());
    }

    // Two calls per server, one round trip
    let mut batch = BatchRequest::new();
    for server in &servers {
        for category in ["C__CATG__CPU", "C__CATG__MEMORY"] {
            batch.add(
                "cmdb.category.read",
                json!({ "objID": &server.id, "category": category }),
            )?;
        }
    }
    let response = client.batch(batch).await?;

    let entries = |index: usize| {
        response
            .value(index)
            .map(|v| v.as_array().map_or(0, Vec::len))
    };
    for (i, server) in servers.iter().enumerate() {
        let id = server.id.to_string();
        match (entries(2 * i), entries(2 * i + 1)) {
            (Ok(cpus), Ok(memory)) => println!(
                "{:>6}  {:<30} {} CPU entries, {} memory entries",
                id, server.title, cpus, memory
            ),
            (Err(e), _) | (_, Err(e)) => println!("{:>6}  {:<30} error: {}", id, server.title, e),
        }
    }

    Ok(())
}
