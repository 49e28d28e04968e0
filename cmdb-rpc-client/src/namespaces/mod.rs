//! Namespace wrappers
//!
//! Each wrapper shapes the parameter object of a handful of remote methods
//! and calls [`CmdbClient::request`] or [`CmdbClient::batch`]. This is the
//! layer where application failures become errors: a JSON-RPC `error`
//! object or a `success: false` marker is raised as
//! [`Error::Application`](cmdb_rpc_core::Error::Application).
//!
//! Wrappers hold a clone of the client, so they are cheap to create on
//! every call:
//!
//! ```rust,no_run
//! # async fn example(client: &cmdb_rpc_client::CmdbClient) -> cmdb_rpc_core::Result<()> {
//! let object = client.objects().read(42).await?;
//! let cpus = client.categories().read(42, "C__CATG__CPU").await?;
//! # Ok(())
//! # }
//! ```

mod categories;
mod dialogs;
mod idoit;
mod locations;
mod objects;

pub use categories::Categories;
pub use dialogs::Dialogs;
pub use idoit::{Idoit, VersionInfo};
pub use locations::{LocationEntry, Locations};
pub use objects::{NewObject, Objects};

use cmdb_rpc_core::{Error, ProtocolError, Result};
use serde_json::Value;

/// Read a numeric id from `value[key]`
///
/// The remote API sends ids both as numbers and as numeric strings.
pub(crate) fn id_field(value: &Value, key: &str) -> Result<u64> {
    let field = &value[key];
    field
        .as_u64()
        .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| {
            Error::from(ProtocolError::UnexpectedShape(format!(
                "expected a numeric {:?} in {}",
                key, value
            )))
        })
}

/// Interpret a result value as a list
pub(crate) fn into_list(value: Value, method: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        // Empty lists are sometimes sent as an empty object
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Null => Ok(Vec::new()),
        other => Err(ProtocolError::UnexpectedShape(format!(
            "{} returned {} instead of a list",
            method, other
        ))
        .into()),
    }
}
