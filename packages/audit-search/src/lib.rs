//! Search gateway: the seam between the audit service and the document store.

pub mod dsl;
pub mod elasticsearch;

mod error;

pub use elasticsearch::ElasticsearchBackend;
pub use error::{Error, Result};

use std::{future::Future, pin::Pin};

use serde_json::Value;

use audit_domain::query::{AggregationRequest, SearchRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only access to an indexed document store.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, request: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>>;

	fn aggregate<'a>(
		&'a self,
		request: &'a AggregationRequest,
	) -> BoxFuture<'a, Result<Vec<Bucket>>>;
}

/// A stored document as returned by the engine, before it is bound to a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
	pub id: String,
	pub source: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
	pub hits: Vec<RawHit>,
	/// Matches across all pages, not just the ones returned.
	pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
	pub key: String,
	pub doc_count: u64,
}
