//! Batch request engine
//!
//! The engine turns logical calls into one round trip and maps the reply
//! back onto the calls:
//!
//! 1. **Assign ids**: every call gets a fresh id from the engine's
//!    [`IdSequence`]; a side table remembers id → position
//! 2. **Send once**: the envelopes go out as one JSON array
//! 3. **Decode**: the reply is parsed into per-call results
//! 4. **Correlate**: each result is placed at the position of the call
//!    that owns its id; unknown, duplicate or missing ids abort the batch
//! 5. **Return**: results come back in call order, each with its own
//!    success or application-error status
//!
//! # Failure Model
//!
//! A transport failure fails the whole batch with no partial results; the
//! caller cannot know which calls ran server-side. Application errors are
//! never raised by [`BatchEngine::batch_request`]; they stay attached to
//! their result. The single-call path, [`BatchEngine::request`], does raise
//! them because there is nothing else to return.
//!
//! Ids are never reused, so a reply that carries an id from an earlier
//! batch is rejected as an unknown id.

use crate::batch::BatchResponse;
use crate::metrics::ClientMetrics;
use crate::transport::Transport;
use cmdb_rpc_core::{
    codec, Call, Envelope, Error, IdSequence, Params, ProtocolError, RawResult, Result,
    RpcOutcome, Session,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Aggregates calls into JSON-RPC batches over a [`Transport`]
pub struct BatchEngine {
    transport: Arc<dyn Transport>,
    ids: IdSequence,
    session: Session,
    metrics: Option<Arc<ClientMetrics>>,
}

impl BatchEngine {
    /// Create an engine with a fresh id sequence
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self::with_ids(transport, session, IdSequence::new())
    }

    /// Create an engine with an explicit id sequence
    pub fn with_ids(transport: Arc<dyn Transport>, session: Session, ids: IdSequence) -> Self {
        Self {
            transport,
            ids,
            session,
            metrics: None,
        }
    }

    /// Record request metrics through `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Session parameters attached to every call
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The id the next envelope will carry
    pub fn next_id_hint(&self) -> u64 {
        self.ids.peek()
    }

    /// Send one call and return its result value
    ///
    /// The envelope goes out as a bare JSON object, not a one-element
    /// array. JSON-RPC errors and `success: false` markers are raised as
    /// [`Error::Application`].
    #[tracing::instrument(skip(self, params), fields(method = %method.as_ref()))]
    pub async fn request(
        &self,
        method: impl Into<String> + AsRef<str>,
        params: Params,
    ) -> Result<Value> {
        let start = Instant::now();
        let method = method.into();
        let id = self.ids.next_id()?;
        let envelope = codec::encode(Call::new(method.clone(), params), id, &self.session);
        let body = codec::encode_single(&envelope)?;

        if let Some(ref m) = self.metrics {
            m.record_round_trip("single");
        }
        let reply = self.round_trip(body).await;
        let raw = reply.and_then(|bytes| codec::decode_single(&bytes));
        let outcome = match raw {
            Ok(RawResult { id: actual, .. }) if actual != id => {
                let err = Error::from(ProtocolError::IdMismatch {
                    expected: id,
                    actual,
                });
                self.record_failure(&method, &err, start);
                return Err(err);
            }
            Ok(raw) => raw.outcome,
            Err(err) => {
                self.record_failure(&method, &err, start);
                return Err(err);
            }
        };

        match outcome.into_result() {
            Ok(value) => {
                self.record_success(&method, start);
                tracing::debug!(
                    id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Request completed"
                );
                Ok(value)
            }
            Err(err) => {
                self.record_failure(&method, &err, start);
                tracing::debug!(id, error = %err, "Request returned an application error");
                Err(err)
            }
        }
    }

    /// Send `calls` in one round trip and return their outcomes in call order
    #[tracing::instrument(skip(self, calls), fields(size = calls.len()))]
    pub async fn batch_request(&self, calls: Vec<Call>) -> Result<BatchResponse> {
        if calls.is_empty() {
            return Err(Error::InvalidArgument("batch cannot be empty".to_string()));
        }

        let start = Instant::now();
        let size = calls.len();

        let mut index_of: HashMap<u64, usize> = HashMap::with_capacity(size);
        let mut methods: Vec<String> = Vec::with_capacity(size);
        let mut envelopes: Vec<Envelope> = Vec::with_capacity(size);
        for (index, call) in calls.into_iter().enumerate() {
            let id = self.ids.next_id()?;
            index_of.insert(id, index);
            methods.push(call.method().to_string());
            envelopes.push(codec::encode(call, id, &self.session));
        }

        let result = self.dispatch(&envelopes, &index_of).await;

        if let Some(ref m) = self.metrics {
            m.record_batch(size as u64);
        }

        match result {
            Ok(outcomes) => {
                let failed = outcomes.iter().filter(|o| !o.is_success()).count();
                if let Some(ref m) = self.metrics {
                    let elapsed = start.elapsed().as_secs_f64();
                    for (method, outcome) in methods.iter().zip(&outcomes) {
                        let status = if outcome.is_success() { "success" } else { "error" };
                        m.record_request(method, status, elapsed);
                        if !outcome.is_success() {
                            m.record_error("application");
                        }
                    }
                }
                tracing::debug!(
                    size,
                    failed,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Batch completed"
                );
                Ok(BatchResponse::new(outcomes))
            }
            Err(err) => {
                if let Some(ref m) = self.metrics {
                    m.record_error(err.kind());
                }
                match &err {
                    Error::Protocol(p) => tracing::warn!(error = %p, "Batch reply rejected"),
                    other => tracing::error!(error = %other, "Batch failed"),
                }
                Err(err)
            }
        }
    }

    async fn dispatch(
        &self,
        envelopes: &[Envelope],
        index_of: &HashMap<u64, usize>,
    ) -> Result<Vec<RpcOutcome>> {
        let body = codec::encode_batch(envelopes)?;
        let reply = self.round_trip(body).await?;
        let raw = codec::decode_batch(&reply)?;
        correlate(envelopes, index_of, raw)
    }

    async fn round_trip(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        self.transport.send(body).await.map_err(|e| {
            tracing::error!(error = %e, "Transport failure");
            Error::Transport(e)
        })
    }

    fn record_success(&self, method: &str, start: Instant) {
        if let Some(ref m) = self.metrics {
            m.record_request(method, "success", start.elapsed().as_secs_f64());
        }
    }

    fn record_failure(&self, method: &str, err: &Error, start: Instant) {
        if let Some(ref m) = self.metrics {
            m.record_request(method, "error", start.elapsed().as_secs_f64());
            m.record_error(err.kind());
        }
    }
}

/// Place every decoded result at the position of the call that owns its id
fn correlate(
    envelopes: &[Envelope],
    index_of: &HashMap<u64, usize>,
    raw: Vec<RawResult>,
) -> Result<Vec<RpcOutcome>> {
    let mut slots: Vec<Option<RpcOutcome>> = vec![None; envelopes.len()];

    for result in raw {
        let index = *index_of
            .get(&result.id)
            .ok_or(ProtocolError::UnknownId(result.id))?;
        let slot = &mut slots[index];
        if slot.is_some() {
            return Err(ProtocolError::DuplicateId(result.id).into());
        }
        *slot = Some(result.outcome);
    }

    let missing: Vec<u64> = envelopes
        .iter()
        .zip(&slots)
        .filter(|(_, slot)| slot.is_none())
        .map(|(envelope, _)| envelope.id)
        .collect();
    if !missing.is_empty() {
        return Err(ProtocolError::MissingResponses(missing).into());
    }

    Ok(slots.into_iter().flatten().collect())
}
