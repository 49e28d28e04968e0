//! Common test utilities for cmdb-rpc-client integration tests
//!
//! This module provides an in-memory transport and JSON-RPC reply helpers
//! so the engine can be exercised without a real CMDB. HTTP tests use
//! `wiremock` directly.

#![allow(dead_code)]

use async_trait::async_trait;
use cmdb_rpc_client::Transport;
use cmdb_rpc_core::TransportError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type TransportHandler = dyn Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync;

/// In-memory transport
///
/// Every request body is parsed and recorded, then answered by the
/// handler. Tests assert on what was sent and how often.
pub struct MockTransport {
    handler: Box<TransportHandler>,
    sent: Mutex<Vec<Value>>,
}

impl MockTransport {
    /// Transport answering with raw bytes (or a transport error)
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Value) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Transport answering with a JSON document
    pub fn json<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |request| Ok(serde_json::to_vec(&handler(request)).unwrap()))
    }

    /// Transport answering each call with `result_for(method, params)`
    ///
    /// Batches are answered with an array in request order.
    pub fn echo<F>(result_for: F) -> Arc<Self>
    where
        F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
    {
        Self::json(move |request| {
            let answer = |call: &Value| {
                mock_response(
                    call["id"].as_u64().unwrap(),
                    result_for(call["method"].as_str().unwrap(), &call["params"]),
                )
            };
            match request {
                Value::Array(calls) => Value::Array(calls.iter().map(answer).collect()),
                call => answer(call),
            }
        })
    }

    /// Transport that always fails with `error`
    pub fn failing(error: TransportError) -> Arc<Self> {
        Self::new(move |_| Err(error.clone()))
    }

    /// Parsed request bodies, in send order
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of round trips performed
    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Ids of every envelope sent so far
    pub fn sent_ids(&self) -> Vec<u64> {
        self.sent()
            .iter()
            .flat_map(|body| match body {
                Value::Array(calls) => calls.clone(),
                call => vec![call.clone()],
            })
            .map(|call| call["id"].as_u64().unwrap())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let request: Value = serde_json::from_slice(&body).expect("engine sent invalid JSON");
        self.sent.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

/// JSON-RPC success response
pub fn mock_response(id: u64, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
}

/// JSON-RPC error response
pub fn mock_error_response(id: u64, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": id
    })
}

/// Answer a batch request by applying `respond` to every call
pub fn answer_batch<F>(request: &Value, respond: F) -> Value
where
    F: Fn(u64, &Value) -> Value,
{
    let calls = request.as_array().expect("expected a batch");
    Value::Array(
        calls
            .iter()
            .map(|call| respond(call["id"].as_u64().unwrap(), call))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_response_format() {
        let response = mock_response(1, json!({"value": 42})).to_string();
        assert!(response.contains("\"jsonrpc\":\"2.0\""));
        assert!(response.contains("\"id\":1"));
        assert!(response.contains("\"result\""));
    }

    #[test]
    fn test_mock_error_response_format() {
        let response = mock_error_response(1, -32601, "Method not found");
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found");
    }
}
