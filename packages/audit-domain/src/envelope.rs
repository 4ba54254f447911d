use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One page of records plus the number of matches across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T> {
	pub results: Vec<T>,
	pub total_hits: u64,
}

/// Document counts keyed by the grouped field's value. Zero counts are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
	pub stats: BTreeMap<String, u64>,
}
