//! Envelope codec: logical calls to wire bytes and back
//!
//! Encoding is pure: it consumes an id handed out by the caller's
//! [`IdSequence`](crate::IdSequence) and never touches shared state.
//!
//! Decoding is strict about structure and lenient about outcome. A reply
//! that is not JSON is a transport fault (the body never made it through
//! intact); JSON that does not look like a JSON-RPC response is a protocol
//! fault; a well-formed response carrying an `error` object decodes
//! successfully into [`RpcOutcome::ApplicationError`].
//!
//! # Examples
//!
//! ```rust
//! use cmdb_rpc_core::{codec, Call, RpcOutcome, Session};
//! use serde_json::json;
//!
//! let call = Call::from_value("cmdb.object.read", json!({"id": 42})).unwrap();
//! let envelope = codec::encode(call, 1, &Session::new().with_api_key("secret"));
//! let body = codec::encode_single(&envelope).unwrap();
//! assert!(String::from_utf8(body).unwrap().contains("\"apikey\":\"secret\""));
//!
//! let reply = br#"[{"jsonrpc":"2.0","id":1,"result":{"title":"srv"}},
//!                  {"jsonrpc":"2.0","id":2,"error":{"code":-32000,"message":"not found"}}]"#;
//! let results = codec::decode_batch(reply).unwrap();
//! assert!(matches!(results[0].outcome, RpcOutcome::Ok(_)));
//! assert!(matches!(results[1].outcome, RpcOutcome::ApplicationError(_)));
//! ```

use crate::error::{Error, JsonRpcErrorData, ProtocolError, Result, TransportError};
use crate::session::Session;
use crate::types::{Call, Envelope, RawResult, RpcOutcome};
use serde_json::Value;

/// Wrap a call in an envelope with the given id and session parameters
pub fn encode(call: Call, id: u64, session: &Session) -> Envelope {
    let (method, mut params) = call.into_parts();
    session.apply(&mut params);
    Envelope::new(id, method, params)
}

/// Serialize one envelope as a bare JSON object
pub fn encode_single(envelope: &Envelope) -> Result<Vec<u8>> {
    serde_json::to_vec(envelope)
        .map_err(|e| Error::InvalidArgument(format!("cannot serialize request: {}", e)))
}

/// Serialize envelopes as one JSON array
///
/// An empty batch is rejected; several remote servers answer `[]` with an
/// error instead of an empty array.
pub fn encode_batch(envelopes: &[Envelope]) -> Result<Vec<u8>> {
    if envelopes.is_empty() {
        return Err(Error::InvalidArgument("batch cannot be empty".to_string()));
    }
    serde_json::to_vec(envelopes)
        .map_err(|e| Error::InvalidArgument(format!("cannot serialize batch: {}", e)))
}

/// Decode a reply to a single (non-batch) request
pub fn decode_single(body: &[u8]) -> Result<RawResult> {
    let value = parse_body(body)?;
    decode_response(value, 0)
}

/// Decode a reply to a batch request
///
/// The result keeps the order the server sent; re-ordering is the batch
/// engine's job.
pub fn decode_batch(body: &[u8]) -> Result<Vec<RawResult>> {
    match parse_body(body)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| decode_response(item, index))
            .collect(),
        _ => Err(ProtocolError::NotAnArray.into()),
    }
}

fn parse_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body)
        .map_err(|e| Error::Transport(TransportError::MalformedBody(e.to_string())))
}

/// Structural checks shared by single and batch decoding
///
/// `index` is the element's position in the reply and only feeds error
/// messages.
pub fn decode_response(value: Value, index: usize) -> Result<RawResult> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        _ => return Err(ProtocolError::NotAnObject { index }.into()),
    };

    let id = match obj.get("id") {
        None | Some(Value::Null) => return Err(ProtocolError::MissingId { index }.into()),
        Some(id) => id.as_u64().ok_or_else(|| ProtocolError::NonNumericId {
            index,
            id: id.to_string(),
        })?,
    };

    match obj.remove("error") {
        Some(Value::Null) | None => {}
        Some(error) => {
            let error: JsonRpcErrorData = serde_json::from_value(error)
                .map_err(|_| ProtocolError::MalformedError { id })?;
            return Ok(RawResult {
                id,
                outcome: RpcOutcome::ApplicationError(error),
            });
        }
    }

    match obj.remove("result") {
        Some(result) => Ok(RawResult {
            id,
            outcome: RpcOutcome::from_result(result),
        }),
        None => Err(ProtocolError::MissingOutcome { id }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protocol(err: Error) -> ProtocolError {
        match err {
            Error::Protocol(p) => p,
            other => panic!("Expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_applies_session() {
        let call = Call::from_value("cmdb.object.read", json!({"id": 1})).unwrap();
        let session = Session::new().with_api_key("key").with_language("en");
        let envelope = encode(call, 12, &session);

        assert_eq!(envelope.id, 12);
        assert_eq!(envelope.jsonrpc, "2.0");
        assert_eq!(envelope.params["apikey"], "key");
        assert_eq!(envelope.params["language"], "en");
    }

    #[test]
    fn test_encode_batch_is_array_in_order() {
        let envelopes: Vec<Envelope> = (1..=3)
            .map(|id| {
                let call = Call::from_value("idoit.version", Value::Null).unwrap();
                encode(call, id, &Session::new())
            })
            .collect();

        let body = encode_batch(&envelopes).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        let ids: Vec<u64> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_encode_empty_batch_rejected() {
        assert!(matches!(encode_batch(&[]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_decode_single_success() {
        let raw = decode_single(br#"{"jsonrpc":"2.0","id":5,"result":{"login":"admin"}}"#).unwrap();
        assert_eq!(raw.id, 5);
        assert_eq!(raw.outcome, RpcOutcome::Ok(json!({"login": "admin"})));
    }

    #[test]
    fn test_decode_single_null_result_is_success() {
        let raw = decode_single(br#"{"jsonrpc":"2.0","id":5,"result":null}"#).unwrap();
        assert_eq!(raw.outcome, RpcOutcome::Ok(Value::Null));
    }

    #[test]
    fn test_decode_single_application_error() {
        let raw = decode_single(
            br#"{"jsonrpc":"2.0","id":2,"error":{"code":-32000,"message":"not found"}}"#,
        )
        .unwrap();
        let err = raw.outcome.error().unwrap();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "not found");
    }

    #[test]
    fn test_decode_error_with_null_result_member() {
        let raw = decode_single(
            br#"{"id":2,"result":null,"error":{"code":-32603,"message":"Internal error"}}"#,
        )
        .unwrap();
        assert!(matches!(raw.outcome, RpcOutcome::ApplicationError(_)));
    }

    #[test]
    fn test_decode_result_with_null_error_member() {
        let raw = decode_single(br#"{"id":2,"result":[1,2],"error":null}"#).unwrap();
        assert_eq!(raw.outcome, RpcOutcome::Ok(json!([1, 2])));
    }

    #[test]
    fn test_decode_missing_outcome() {
        let err = decode_single(br#"{"jsonrpc":"2.0","id":4}"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::MissingOutcome { id: 4 });
    }

    #[test]
    fn test_decode_missing_or_null_id() {
        let err = decode_single(br#"{"jsonrpc":"2.0","result":1}"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::MissingId { index: 0 });

        let err = decode_single(
            br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
        )
        .unwrap_err();
        assert_eq!(protocol(err), ProtocolError::MissingId { index: 0 });
    }

    #[test]
    fn test_decode_non_numeric_id() {
        let err = decode_single(br#"{"jsonrpc":"2.0","id":"7","result":1}"#).unwrap_err();
        assert!(matches!(protocol(err), ProtocolError::NonNumericId { .. }));

        let err = decode_single(br#"{"jsonrpc":"2.0","id":-1,"result":1}"#).unwrap_err();
        assert!(matches!(protocol(err), ProtocolError::NonNumericId { .. }));
    }

    #[test]
    fn test_decode_malformed_error_object() {
        let err = decode_single(br#"{"id":3,"error":"boom"}"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::MalformedError { id: 3 });
    }

    #[test]
    fn test_decode_invalid_json_is_transport_fault() {
        let err = decode_single(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::MalformedBody(_))
        ));
    }

    #[test]
    fn test_decode_batch_requires_array() {
        let err = decode_batch(br#"{"jsonrpc":"2.0","id":1,"result":1}"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::NotAnArray);
    }

    #[test]
    fn test_decode_batch_keeps_wire_order() {
        let results = decode_batch(
            br#"[{"id":3,"result":"c"},{"id":1,"result":"a"},{"id":2,"result":"b"}]"#,
        )
        .unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_decode_batch_carries_application_errors() {
        let body = json!([
            {"id": 1, "result": {}},
            {"id": 2, "error": {"code": -32000, "message": "not found"}},
            {"id": 3, "result": {}}
        ]);
        let results = decode_batch(body.to_string().as_bytes()).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].outcome.is_success());
        assert!(!results[1].outcome.is_success());
        assert!(results[2].outcome.is_success());
    }

    #[test]
    fn test_decode_batch_rejects_malformed_element() {
        let err = decode_batch(br#"[{"id":1,"result":{}},42]"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::NotAnObject { index: 1 });

        let err = decode_batch(br#"[{"id":1,"result":{}},{"result":{}}]"#).unwrap_err();
        assert_eq!(protocol(err), ProtocolError::MissingId { index: 1 });
    }
}
