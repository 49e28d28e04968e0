//! Per-engine identity state: the request id sequence and the session
//! parameters attached to every envelope.

use crate::error::{Error, Result};
use crate::types::Params;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic source of request ids
///
/// Ids start at 1 and are never reused for the lifetime of the sequence.
/// Safe to share between tasks. Once `u64::MAX` is reached the sequence is
/// exhausted and `next_id` fails instead of wrapping to 0.
///
/// # Examples
///
/// ```rust
/// use cmdb_rpc_core::IdSequence;
///
/// let ids = IdSequence::new();
/// assert_eq!(ids.next_id().unwrap(), 1);
/// assert_eq!(ids.next_id().unwrap(), 2);
/// assert_eq!(ids.peek(), 3);
/// ```
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    /// Create a sequence starting at 1
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create a sequence starting at `first`
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Take the next unused id
    pub fn next_id(&self) -> Result<u64> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| Error::InvalidArgument("request id sequence exhausted".to_string()))
    }

    /// The id the next call to `next_id` will return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter key the remote API reads the api key from
pub const API_KEY_PARAM: &str = "apikey";
/// Parameter key selecting the response language
pub const LANGUAGE_PARAM: &str = "language";

/// Session parameters merged into every call
///
/// The remote API authenticates each call by an `apikey` member inside
/// `params` and localises labels by `language`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    api_key: Option<String>,
    language: Option<String>,
}

impl Session {
    /// A session without credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an api key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Attach a language code such as "en" or "de"
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// The configured api key
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The configured language
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Merge session members into `params`
    ///
    /// Keys the caller already set are left alone.
    pub fn apply(&self, params: &mut Params) {
        if let Some(key) = &self.api_key {
            params
                .entry(API_KEY_PARAM)
                .or_insert_with(|| Value::String(key.clone()));
        }
        if let Some(language) = &self.language {
            params
                .entry(LANGUAGE_PARAM)
                .or_insert_with(|| Value::String(language.clone()));
        }
    }
}
