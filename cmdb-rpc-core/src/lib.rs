//! Core envelope types and codec for the CMDB JSON-RPC client
//!
//! This crate holds everything that does not need a network:
//!
//! - **Types**: [`Call`], [`Envelope`], [`RawResult`] and the tagged
//!   [`RpcOutcome`] a response decodes into
//! - **Codec**: encoding calls into JSON-RPC 2.0 envelopes and decoding
//!   single or batched replies with strict structural checks
//! - **Session**: the id sequence and the `apikey`/`language` members
//!   attached to every call
//! - **Errors**: the four-way fault taxonomy (invalid argument, transport,
//!   protocol, application)
//! - **Observability**: `tracing` + OpenTelemetry setup
//!
//! The `cmdb-rpc-client` crate builds the batch engine and HTTP transport on
//! top of these pieces.
//!
//! # Example
//!
//! ```rust
//! use cmdb_rpc_core::{codec, Call, IdSequence, Session};
//! use serde_json::json;
//!
//! let ids = IdSequence::new();
//! let session = Session::new().with_api_key("c1ia5q");
//!
//! let call = Call::from_value("cmdb.object.read", json!({"id": 42})).unwrap();
//! let envelope = codec::encode(call, ids.next_id().unwrap(), &session);
//! assert_eq!(envelope.id, 1);
//! assert_eq!(envelope.params["apikey"], "c1ia5q");
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod session;
pub mod types;

pub use error::{Error, JsonRpcErrorData, ProtocolError, Result, TransportError};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use session::{IdSequence, Session};
pub use types::{Call, Envelope, Params, RawResult, RpcOutcome};
