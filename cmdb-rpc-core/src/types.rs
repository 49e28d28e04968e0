//! Envelope and result types for the CMDB JSON-RPC API
//!
//! A logical API call is a [`Call`]: a method name plus a JSON object of
//! parameters. Before it goes on the wire it is wrapped in an [`Envelope`]
//! carrying the JSON-RPC version tag and a correlation id. Replies are
//! decoded into [`RawResult`]s whose [`RpcOutcome`] says whether the call
//! succeeded, failed at the application level, or returned one of the
//! ad-hoc `success`/`message` shapes some remote namespaces use.
//!
//! # Wire Shape
//!
//! ```json
//! {"jsonrpc":"2.0","id":7,"method":"cmdb.object.read","params":{"id":42}}
//! ```
//!
//! Parameters are always a JSON object; the remote API does not accept
//! positional parameters.

use crate::error::{Error, JsonRpcErrorData, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version tag sent with every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Parameter object of a call
pub type Params = Map<String, Value>;

/// One logical API call
///
/// # Examples
///
/// ```rust
/// use cmdb_rpc_core::Call;
/// use serde_json::json;
///
/// let call = Call::from_value("cmdb.object.read", json!({"id": 42})).unwrap();
/// assert_eq!(call.method(), "cmdb.object.read");
/// assert_eq!(call.params()["id"], 42);
///
/// // Positional parameters are rejected
/// assert!(Call::from_value("cmdb.object.read", json!([42])).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    method: String,
    params: Params,
}

impl Call {
    /// Create a call from a method name and a parameter object
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Create a call from any JSON value
    ///
    /// `null` becomes an empty parameter object. Anything other than an
    /// object or `null` is an `InvalidArgument`.
    pub fn from_value(method: impl Into<String>, params: Value) -> Result<Self> {
        let method = method.into();
        match params {
            Value::Object(map) => Ok(Self::new(method, map)),
            Value::Null => Ok(Self::new(method, Params::new())),
            other => Err(Error::InvalidArgument(format!(
                "params for {} must be a JSON object, got {}",
                method,
                json_type(&other)
            ))),
        }
    }

    /// Create a call from any serializable parameter struct
    pub fn from_serialize<P: Serialize>(method: impl Into<String>, params: P) -> Result<Self> {
        let method = method.into();
        let value = serde_json::to_value(params).map_err(|e| {
            Error::InvalidArgument(format!("params for {} are not serializable: {}", method, e))
        })?;
        Self::from_value(method, value)
    }

    /// Remote method name
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parameter object
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Split into method name and parameter object
    pub fn into_parts(self) -> (String, Params) {
        (self.method, self.params)
    }
}

/// Wire request unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Correlation id, unique for the engine's lifetime
    pub id: u64,
    /// Remote method name
    pub method: String,
    /// Parameter object
    pub params: Params,
}

impl Envelope {
    /// Create an envelope with the JSON-RPC version tag filled in
    pub fn new(id: u64, method: impl Into<String>, params: Params) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// What a single response says about its call
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// `result` present with no ad-hoc success marker
    Ok(Value),
    /// `error` object present
    ApplicationError(JsonRpcErrorData),
    /// `result` is an object carrying an ad-hoc `success` marker
    ///
    /// Passed through untouched; [`RpcOutcome::into_result`] interprets it.
    Raw(Value),
}

impl RpcOutcome {
    /// Classify a decoded `result` member
    pub fn from_result(result: Value) -> Self {
        let has_marker = result
            .as_object()
            .map(|obj| obj.contains_key("success"))
            .unwrap_or(false);
        if has_marker {
            RpcOutcome::Raw(result)
        } else {
            RpcOutcome::Ok(result)
        }
    }

    /// True unless the outcome is an application failure
    ///
    /// A `Raw` result counts as a success unless its marker is `false`.
    pub fn is_success(&self) -> bool {
        match self {
            RpcOutcome::Ok(_) => true,
            RpcOutcome::ApplicationError(_) => false,
            RpcOutcome::Raw(value) => value.get("success").and_then(Value::as_bool) != Some(false),
        }
    }

    /// Borrow the error object, if this is a JSON-RPC application error
    pub fn error(&self) -> Option<&JsonRpcErrorData> {
        match self {
            RpcOutcome::ApplicationError(err) => Some(err),
            _ => None,
        }
    }

    /// Apply the wrapper-layer failure policy
    ///
    /// JSON-RPC errors and `success: false` markers become
    /// [`Error::Application`]; everything else yields the result value,
    /// with `Raw` results returned unmodified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cmdb_rpc_core::RpcOutcome;
    /// use serde_json::json;
    ///
    /// let ok = RpcOutcome::from_result(json!({"id": 12, "success": true}));
    /// assert_eq!(ok.into_result().unwrap()["id"], 12);
    ///
    /// let rejected = RpcOutcome::from_result(json!({"success": false, "message": "locked"}));
    /// assert!(rejected.into_result().is_err());
    /// ```
    pub fn into_result(self) -> Result<Value> {
        match self {
            RpcOutcome::Ok(value) => Ok(value),
            RpcOutcome::ApplicationError(err) => Err(err.into()),
            RpcOutcome::Raw(value) => {
                if value.get("success").and_then(Value::as_bool) == Some(false) {
                    let message = value
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("request was not successful")
                        .to_string();
                    Err(Error::Application {
                        code: None,
                        message,
                        data: Some(value),
                    })
                } else {
                    Ok(value)
                }
            }
        }
    }
}

/// One decoded response object tagged with the id it declares
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// Declared correlation id
    pub id: u64,
    /// Success or failure of the call
    pub outcome: RpcOutcome,
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
