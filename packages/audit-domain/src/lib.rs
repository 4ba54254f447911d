//! Audit record types and the pure query-routing layer.
//!
//! Nothing here performs I/O. Routers map sparse optional parameters to exactly one
//! [`query::Query`]; aggregation builders map grouping parameters to an
//! [`query::AggregationRequest`].

pub mod calls;
pub mod envelope;
pub mod query;
pub mod routing;
pub mod time_serde;
pub mod traffic;

mod error;

pub use error::{Error, Result};

use serde::{Deserialize, Deserializer};

/// A stored audit record whose identifier may have to be filled from the hit metadata.
pub trait AuditRecord
where
	Self: serde::de::DeserializeOwned + serde::Serialize + Send,
{
	fn id_mut(&mut self) -> &mut String;
}

/// Reads a record `id`, treating an explicit `null` like a missing key.
pub(crate) fn id_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
