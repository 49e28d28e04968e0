//! Fault taxonomy for cmdb-rpc
//!
//! Every failure a caller can observe falls into one of four classes:
//!
//! - **InvalidArgument**: the caller asked for something meaningless (an
//!   empty batch, a call whose params are not a JSON object, a bad endpoint)
//! - **Transport**: the round trip itself failed (timeout, refused
//!   connection, non-2xx status, a body that is not JSON). The whole batch is
//!   failed; no partial results exist.
//! - **Protocol**: the remote answered with JSON that is not a valid
//!   JSON-RPC reply for what was sent (missing/unknown/duplicate ids, a
//!   non-array where an array was expected, ...)
//! - **Application**: the remote executed the call and reported a failure.
//!   Inside a batch this is carried per result; only the single-call path
//!   and the namespace wrappers raise it.
//!
//! `JsonRpcErrorData` is the wire form of a JSON-RPC `error` object and is
//! what application failures are decoded from.
//!
//! # Examples
//!
//! ```rust
//! use cmdb_rpc_core::{Error, JsonRpcErrorData, TransportError};
//!
//! let err: Error = TransportError::Timeout.into();
//! assert!(err.is_retryable());
//!
//! let app = Error::from(JsonRpcErrorData::new(-32000, "not found"));
//! assert!(!app.is_retryable());
//! assert_eq!(app.to_string(), "Application error [-32000]: not found");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for cmdb-rpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type returned by every fallible cmdb-rpc operation
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The caller supplied an argument that cannot be sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The round trip failed below JSON-RPC; the whole batch is failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response is not a valid JSON-RPC answer to the request
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The remote executed the call and reported a failure
    ///
    /// `code` is `None` when the failure came from an ad-hoc
    /// `success: false` marker rather than a JSON-RPC `error` object.
    #[error("Application error {}: {message}", fmt_code(.code))]
    Application {
        /// JSON-RPC error code, when the server supplied one
        code: Option<i64>,
        /// Server-supplied message
        message: String,
        /// Optional structured details
        data: Option<serde_json::Value>,
    },
}

fn fmt_code(code: &Option<i64>) -> String {
    match code {
        Some(code) => format!("[{}]", code),
        None => "[-]".to_string(),
    }
}

impl Error {
    /// Whether a caller-level retry policy may re-send the operation
    ///
    /// Only transport faults qualify. Protocol and argument faults will
    /// repeat deterministically, and application faults mean the server
    /// already ran the call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Short label for the fault class, used as a metric attribute
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Transport(_) => "transport",
            Error::Protocol(_) => "protocol",
            Error::Application { .. } => "application",
        }
    }
}

impl From<JsonRpcErrorData> for Error {
    fn from(err: JsonRpcErrorData) -> Self {
        Error::Application {
            code: Some(err.code),
            message: err.message,
            data: err.data,
        }
    }
}

/// Failures of the transport collaborator
///
/// Kept free of any HTTP client types so alternative transports (and test
/// doubles) can report the same conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete within the transport's deadline
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure (refused, reset, DNS, TLS, ...)
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success HTTP status
    #[error("server returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response body is not a JSON document
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(String),

    /// The in-flight request was cancelled
    #[error("request was cancelled")]
    Cancelled,
}

/// Structural violations of the JSON-RPC reply contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A batch was sent but the reply is not a JSON array
    #[error("expected a JSON array in reply to a batch")]
    NotAnArray,

    /// A response element is not a JSON object
    #[error("response element {index} is not a JSON object")]
    NotAnObject {
        /// Position of the element in the reply
        index: usize,
    },

    /// A response object has no `id`
    #[error("response element {index} has no id")]
    MissingId {
        /// Position of the element in the reply
        index: usize,
    },

    /// A response object has an `id` that is not a non-negative integer
    #[error("response element {index} has a non-numeric id: {id}")]
    NonNumericId {
        /// Position of the element in the reply
        index: usize,
        /// The offending id, rendered as JSON
        id: String,
    },

    /// A response object carries neither `result` nor `error`
    #[error("response {id} has neither result nor error")]
    MissingOutcome {
        /// Declared id of the response
        id: u64,
    },

    /// A response `error` member lacks a numeric `code` or a `message`
    #[error("response {id} has a malformed error object")]
    MalformedError {
        /// Declared id of the response
        id: u64,
    },

    /// A response id does not belong to the request that was sent
    #[error("response carries unknown id {0}")]
    UnknownId(u64),

    /// The same id was answered twice
    #[error("response carries duplicate id {0}")]
    DuplicateId(u64),

    /// Some request ids were never answered
    #[error("no response for id(s) {0:?}")]
    MissingResponses(Vec<u64>),

    /// A result value does not deserialize into the type the caller asked for
    #[error("unexpected result shape: {0}")]
    UnexpectedShape(String),

    /// A single request was answered with a different id
    #[error("expected response id {expected}, got {actual}")]
    IdMismatch {
        /// Id that was sent
        expected: u64,
        /// Id that came back
        actual: u64,
    },
}

/// JSON-RPC 2.0 error object as it appears on the wire
///
/// # Examples
///
/// ```rust
/// use cmdb_rpc_core::JsonRpcErrorData;
///
/// let err: JsonRpcErrorData =
///     serde_json::from_str(r#"{"code":-32099,"message":"Object not found"}"#).unwrap();
/// assert_eq!(err.code, -32099);
/// assert_eq!(err.to_string(), "[-32099] Object not found");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i64,
    /// Human-readable message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error object carrying additional data
    pub fn with_data(code: i64, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}
