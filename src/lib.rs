//! cmdb-rpc - batching JSON-RPC 2.0 client for CMDB APIs
//!
//! This is the convenience crate that re-exports the cmdb-rpc sub-crates.
//! Use it if you want a single dependency.
//!
//! # Architecture
//!
//! - **cmdb-rpc-core**: call and envelope types, codec, session parameters,
//!   id sequence, error taxonomy, observability setup
//! - **cmdb-rpc-client**: batch engine, HTTP transport, client builder,
//!   retry policies, namespace wrappers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cmdb_rpc::ClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::from_env()?.build()?;
//!
//!     let servers = client
//!         .objects()
//!         .read_many(serde_json::json!({ "type": "C__OBJTYPE__SERVER" }))
//!         .await?;
//!     println!("{} servers", servers.len());
//!
//!     Ok(())
//! }
//! ```

pub use cmdb_rpc_client as client;
pub use cmdb_rpc_core as core;

pub use cmdb_rpc_client::{BatchRequest, BatchResponse, ClientBuilder, CmdbClient};
pub use cmdb_rpc_core::{Error, Result};
