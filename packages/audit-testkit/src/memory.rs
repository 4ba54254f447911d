use std::{
	collections::{BTreeMap, HashMap},
	sync::{Mutex, MutexGuard},
};

use regex::Regex;
use serde_json::Value;
use time::{Date, OffsetDateTime, UtcOffset};
use uuid::Uuid;

use audit_domain::{
	query::{AggregationRequest, Query, SearchRequest, SortOrder},
	time_serde,
};
use audit_search::{BoxFuture, Bucket, Error, RawHit, Result, SearchBackend, SearchHits};

const KEYWORD_SUFFIX: &str = ".keyword";

/// How the next backend calls should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
	Timeout,
	Unavailable,
	Status(u16),
}

/// Engine double that evaluates the query model over seeded JSON documents.
///
/// Text matching is an approximation: multi-match compares lowercased alphanumeric tokens,
/// contains is a case-insensitive substring, wildcard and term are case-sensitive over the raw
/// value. Every request is recorded for inspection.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
	indices: Mutex<HashMap<String, Vec<RawHit>>>,
	searches: Mutex<Vec<SearchRequest>>,
	aggregations: Mutex<Vec<AggregationRequest>>,
	failure: Mutex<Option<Failure>>,
}
impl InMemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores documents under `index`. A document's `id` field becomes its hit id; otherwise a
	/// random one is assigned.
	pub fn seed(&self, index: &str, docs: impl IntoIterator<Item = Value>) {
		let mut indices = lock(&self.indices);
		let stored = indices.entry(index.to_string()).or_default();

		for source in docs {
			let id = source
				.get("id")
				.and_then(Value::as_str)
				.map(str::to_string)
				.unwrap_or_else(|| Uuid::new_v4().to_string());

			stored.push(RawHit { id, source });
		}
	}

	pub fn fail_with(&self, failure: Failure) {
		*lock(&self.failure) = Some(failure);
	}

	pub fn recover(&self) {
		*lock(&self.failure) = None;
	}

	pub fn searches(&self) -> Vec<SearchRequest> {
		lock(&self.searches).clone()
	}

	pub fn aggregations(&self) -> Vec<AggregationRequest> {
		lock(&self.aggregations).clone()
	}

	fn check_failure(&self) -> Result<()> {
		match *lock(&self.failure) {
			None => Ok(()),
			Some(Failure::Timeout) =>
				Err(Error::Timeout { message: "In-memory backend timed out.".to_string() }),
			Some(Failure::Unavailable) =>
				Err(Error::Unavailable { message: "In-memory backend is down.".to_string() }),
			Some(Failure::Status(status)) => Err(Error::Status {
				status,
				body: "In-memory backend rejected the request.".to_string(),
			}),
		}
	}

	fn run_search(&self, request: &SearchRequest) -> Result<SearchHits> {
		lock(&self.searches).push(request.clone());
		self.check_failure()?;

		let indices = lock(&self.indices);
		let mut matched: Vec<&RawHit> = indices
			.get(&request.index)
			.map(|docs| docs.iter().filter(|hit| matches(&request.query, &hit.source)).collect())
			.unwrap_or_else(Vec::new);

		matched.sort_by(|a, b| {
			// Undated documents order before every dated one.
			let order = field_timestamp(&a.source, request.sort.field)
				.cmp(&field_timestamp(&b.source, request.sort.field));

			match request.sort.order {
				SortOrder::Asc => order,
				SortOrder::Desc => order.reverse(),
			}
		});

		let total = matched.len() as u64;
		let from = usize::try_from(request.from).unwrap_or(usize::MAX);
		let size = usize::try_from(request.size).unwrap_or(usize::MAX);
		let hits = matched.into_iter().skip(from).take(size).cloned().collect();

		Ok(SearchHits { hits, total })
	}

	fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<Bucket>> {
		lock(&self.aggregations).push(request.clone());
		self.check_failure()?;

		let indices = lock(&self.indices);
		let mut counts = BTreeMap::<String, u64>::new();

		for hit in indices.get(&request.index).into_iter().flatten() {
			if !request.filter.iter().all(|filter| matches(filter, &hit.source)) {
				continue;
			}
			if let Some(key) = field_value(&hit.source, request.field) {
				*counts.entry(key).or_default() += 1;
			}
		}

		let mut buckets = counts
			.into_iter()
			.map(|(key, doc_count)| Bucket { key, doc_count })
			.collect::<Vec<_>>();

		// Count descending, then key ascending, as the terms aggregation orders them.
		buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
		buckets.truncate(usize::try_from(request.bucket_limit).unwrap_or(usize::MAX));

		Ok(buckets)
	}
}

impl SearchBackend for InMemoryBackend {
	fn search<'a>(&'a self, request: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(async move { self.run_search(request) })
	}

	fn aggregate<'a>(
		&'a self,
		request: &'a AggregationRequest,
	) -> BoxFuture<'a, Result<Vec<Bucket>>> {
		Box::pin(async move { self.run_aggregation(request) })
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn matches(query: &Query, source: &Value) -> bool {
	match query {
		Query::MatchAll => true,
		Query::MultiMatch { text, fields } => {
			let wanted = tokens(text);

			fields.iter().filter_map(|field| field_value(source, field.name)).any(|value| {
				let present = tokens(&value);

				wanted.iter().any(|token| present.contains(token))
			})
		},
		Query::Term { field, value } =>
			field_value(source, field).as_deref() == Some(value.as_str()),
		Query::Contains { field, value } => field_value(source, field)
			.is_some_and(|stored| stored.to_lowercase().contains(&value.to_lowercase())),
		Query::Wildcard { field, pattern } => {
			let Some(stored) = field_value(source, field) else {
				return false;
			};

			glob_regex(pattern).is_ok_and(|re| re.is_match(&stored))
		},
		Query::DateRange { field, from, to } => {
			let Some(day) = field_date(source, field) else {
				return false;
			};

			from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
		},
		Query::Bool { must, filter } =>
			must.iter().chain(filter).all(|query| matches(query, source)),
	}
}

/// Reads a scalar field as text. `.keyword` sub-fields resolve to their parent.
fn field_value(source: &Value, field: &str) -> Option<String> {
	let name = field.strip_suffix(KEYWORD_SUFFIX).unwrap_or(field);

	match source.get(name)? {
		Value::String(value) => Some(value.clone()),
		value @ (Value::Number(_) | Value::Bool(_)) => Some(value.to_string()),
		_ => None,
	}
}

fn field_timestamp(source: &Value, field: &str) -> Option<OffsetDateTime> {
	match source.get(field)? {
		Value::String(raw) => time_serde::parse(raw).ok(),
		Value::Number(millis) => millis
			.as_i64()
			.and_then(|millis| {
				OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
			}),
		_ => None,
	}
}

fn field_date(source: &Value, field: &str) -> Option<Date> {
	field_timestamp(source, field).map(|timestamp| timestamp.to_offset(UtcOffset::UTC).date())
}

fn tokens(text: &str) -> Vec<String> {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_lowercase)
		.collect()
}

fn glob_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
	let mut expr = String::with_capacity(pattern.len() + 2);

	expr.push('^');

	for ch in pattern.chars() {
		match ch {
			'*' => expr.push_str(".*"),
			'?' => expr.push('.'),
			other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
		}
	}

	expr.push('$');

	Regex::new(&expr)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn glob_matches_whole_value_case_sensitively() {
		let re = glob_regex("/api/*").expect("Invalid glob.");

		assert!(re.is_match("/api/orders"));
		assert!(!re.is_match("/v2/api/orders"));

		let re = glob_regex("get?ser").expect("Invalid glob.");

		assert!(re.is_match("getUser"));
		assert!(!re.is_match("GetUser"));

		let re = glob_regex("*Service.*").expect("Invalid glob.");

		assert!(re.is_match("UserService.createUser"));
		assert!(!re.is_match("UserServiceXcreate"));
	}

	#[test]
	fn keyword_fields_resolve_to_parent() {
		let source = json!({ "uri": "/api/orders", "statusCode": 200 });

		assert_eq!(field_value(&source, "uri.keyword").as_deref(), Some("/api/orders"));
		assert_eq!(field_value(&source, "statusCode").as_deref(), Some("200"));
		assert_eq!(field_value(&source, "missing"), None);
	}

	#[test]
	fn multi_match_compares_tokens() {
		assert_eq!(tokens("/api/Orders?id=7"), vec!["api", "orders", "id", "7"]);
	}
}
