//! Batching JSON-RPC 2.0 client for CMDB APIs
//!
//! This crate turns logical API calls into JSON-RPC 2.0 round trips over
//! HTTP. Its core is the [`BatchEngine`], which packs many calls into one
//! request array and maps the reply back onto the calls in their original
//! order, keeping per-call application errors separate from failures of
//! the round trip itself.
//!
//! # Core Features
//!
//! - **Batch Requests**: N calls, one round trip, results in call order
//! - **Single Requests**: one call, one bare JSON-RPC object
//! - **Session Parameters**: `apikey` and `language` added to every call
//! - **Namespace Wrappers**: objects, categories, dialogs, location trees
//! - **Retry Policies**: opt-in, caller-side, transport faults only
//! - **Observability**: OpenTelemetry integration for traces and metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cmdb_rpc_client::{BatchRequest, ClientBuilder};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("https://cmdb.example.com/src/jsonrpc.php")
//!         .api_key("c1ia5q")
//!         .build()?;
//!
//!     // One call
//!     let version = client.idoit().version().await?;
//!     println!("Server: {}", version);
//!
//!     // Many calls, one round trip
//!     let mut batch = BatchRequest::new();
//!     for id in [10, 11, 12] {
//!         batch.add("cmdb.object.read", json!({ "id": id }))?;
//!     }
//!     for (i, outcome) in client.batch(batch).await?.iter().enumerate() {
//!         match outcome.error() {
//!             Some(err) => println!("call {} failed: {}", i, err),
//!             None => println!("call {} ok", i),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

mod batch;
mod client;
mod client_builder;
mod engine;
mod metrics;
pub mod namespaces;
mod retry;
mod transport;

#[cfg(test)]
mod test_support;

pub use batch::{BatchRequest, BatchResponse};
pub use client::CmdbClient;
pub use client_builder::{ClientBuilder, ENV_API_KEY, ENV_LANGUAGE, ENV_TIMEOUT_SECS, ENV_URL};
pub use engine::BatchEngine;
pub use metrics::ClientMetrics;
pub use retry::{retry, ExponentialBackoff, FixedDelay, NoRetry, RetryStrategy};
pub use transport::{parse_headers, HttpTransport, Transport, DEFAULT_TIMEOUT};
