//! In-process transport for unit tests

use crate::transport::Transport;
use crate::{BatchEngine, CmdbClient};
use async_trait::async_trait;
use cmdb_rpc_core::{Session, TransportError};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Handler = dyn Fn(&Value) -> Value + Send + Sync;

/// Answers every request through a closure and keeps what was sent
pub(crate) struct ScriptedTransport {
    handler: Box<Handler>,
    sent: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Every request body sent so far, parsed
    pub(crate) fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let request: Value = serde_json::from_slice(&body).unwrap();
        self.sent.lock().unwrap().push(request.clone());
        let reply = (self.handler)(&request);
        Ok(serde_json::to_vec(&reply).unwrap())
    }
}

/// Reply to a single request or to each element of a batch with `result_for`
pub(crate) fn echo_results<F>(result_for: F) -> impl Fn(&Value) -> Value + Send + Sync + 'static
where
    F: Fn(&str, &Value) -> Value + Send + Sync + 'static,
{
    move |request| {
        let answer = |call: &Value| {
            let method = call["method"].as_str().unwrap_or_default();
            json!({
                "jsonrpc": "2.0",
                "id": call["id"],
                "result": result_for(method, &call["params"]),
            })
        };
        match request {
            Value::Array(calls) => Value::Array(calls.iter().map(answer).collect()),
            call => answer(call),
        }
    }
}

pub(crate) fn client_with(transport: Arc<ScriptedTransport>) -> CmdbClient {
    CmdbClient::new(BatchEngine::new(
        transport,
        Session::new().with_api_key("test-key"),
    ))
}
