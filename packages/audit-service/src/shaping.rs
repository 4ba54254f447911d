use std::collections::BTreeMap;

use audit_domain::{
	AuditRecord,
	envelope::{SearchResponse, StatsResponse},
};
use audit_search::{Bucket, SearchHits};

use crate::{Error, Result};

/// Binds each hit to a record, keeping engine order. A record without its own `id` takes the
/// hit's.
pub(crate) fn records<T>(hits: SearchHits) -> Result<SearchResponse<T>>
where
	T: AuditRecord,
{
	let mut results = Vec::with_capacity(hits.hits.len());

	for hit in hits.hits {
		let mut record: T = serde_json::from_value(hit.source).map_err(|err| {
			Error::SearchFailed {
				message: format!("Stored document {} is not a valid record: {err}.", hit.id),
			}
		})?;
		let id = record.id_mut();

		if id.is_empty() {
			*id = hit.id;
		}

		results.push(record);
	}

	Ok(SearchResponse { results, total_hits: hits.total })
}

pub(crate) fn stats(buckets: Vec<Bucket>) -> StatsResponse {
	let mut stats = BTreeMap::new();

	for bucket in buckets.into_iter().filter(|bucket| bucket.doc_count > 0) {
		*stats.entry(bucket.key).or_insert(0) += bucket.doc_count;
	}

	StatsResponse { stats }
}
