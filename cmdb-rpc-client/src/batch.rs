//! Batch building and ordered result sets
//!
//! A [`BatchRequest`] collects calls in the order they should be answered
//! in. [`BatchResponse`] is what the engine returns: one [`RpcOutcome`] per
//! call, at the same index, regardless of the order the server replied in.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cmdb_rpc_client::{BatchRequest, CmdbClient};
//! use serde_json::json;
//!
//! # async fn example(client: &CmdbClient) -> cmdb_rpc_core::Result<()> {
//! let mut batch = BatchRequest::new();
//! let server = batch.add("cmdb.object.read", json!({"id": 42}))?;
//! let switch = batch.add("cmdb.object.read", json!({"id": 43}))?;
//!
//! let responses = client.batch(batch).await?;
//!
//! // Application errors stay attached to their own index
//! let server = responses.value(server)?;
//! if let Some(err) = responses.get(switch).and_then(|o| o.error()) {
//!     println!("switch lookup failed: {}", err);
//! }
//! # Ok(())
//! # }
//! ```

use cmdb_rpc_core::{Call, Error, JsonRpcErrorData, ProtocolError, Result, RpcOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Ordered collection of calls to send in one round trip
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    calls: Vec<Call>,
}

impl BatchRequest {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call and return the index its outcome will have
    pub fn add<P>(&mut self, method: impl Into<String>, params: P) -> Result<usize>
    where
        P: Serialize,
    {
        let call = Call::from_serialize(method, params)?;
        Ok(self.push(call))
    }

    /// Append a prepared call and return the index its outcome will have
    pub fn push(&mut self, call: Call) -> usize {
        self.calls.push(call);
        self.calls.len() - 1
    }

    /// Number of calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// True when no call was added
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Calls in submission order
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Take the calls out of the builder
    pub fn into_calls(self) -> Vec<Call> {
        self.calls
    }
}

impl From<Vec<Call>> for BatchRequest {
    fn from(calls: Vec<Call>) -> Self {
        Self { calls }
    }
}

impl FromIterator<Call> for BatchRequest {
    fn from_iter<I: IntoIterator<Item = Call>>(iter: I) -> Self {
        Self {
            calls: iter.into_iter().collect(),
        }
    }
}

/// Outcomes of a batch, index-aligned with the submitted calls
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    outcomes: Vec<RpcOutcome>,
}

impl BatchResponse {
    /// Wrap outcomes that are already in call order
    pub fn new(outcomes: Vec<RpcOutcome>) -> Self {
        Self { outcomes }
    }

    /// Outcome of the call at `index`
    pub fn get(&self, index: usize) -> Option<&RpcOutcome> {
        self.outcomes.get(index)
    }

    /// Result value of the call at `index`, raising application failures
    pub fn value(&self, index: usize) -> Result<Value> {
        self.get(index)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("no call at index {}", index)))?
            .into_result()
    }

    /// Typed result of the call at `index`
    pub fn get_as<R>(&self, index: usize) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let value = self.value(index)?;
        serde_json::from_value(value).map_err(|e| {
            Error::from(ProtocolError::UnexpectedShape(format!("call {}: {}", index, e)))
        })
    }

    /// Number of outcomes, equal to the number of calls sent
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// True for an empty response (never produced by the engine)
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when no call failed
    pub fn all_success(&self) -> bool {
        self.outcomes.iter().all(RpcOutcome::is_success)
    }

    /// Indices and error objects of calls that returned a JSON-RPC error
    pub fn errors(&self) -> Vec<(usize, &JsonRpcErrorData)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.error().map(|e| (i, e)))
            .collect()
    }

    /// Iterate outcomes in call order
    pub fn iter(&self) -> std::slice::Iter<'_, RpcOutcome> {
        self.outcomes.iter()
    }

    /// Take the outcomes
    pub fn into_outcomes(self) -> Vec<RpcOutcome> {
        self.outcomes
    }

    /// Apply the failure policy to every outcome, failing on the first error
    pub fn into_values(self) -> Result<Vec<Value>> {
        self.outcomes.into_iter().map(RpcOutcome::into_result).collect()
    }
}

impl IntoIterator for BatchResponse {
    type Item = RpcOutcome;
    type IntoIter = std::vec::IntoIter<RpcOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a> IntoIterator for &'a BatchResponse {
    type Item = &'a RpcOutcome;
    type IntoIter = std::slice::Iter<'a, RpcOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
