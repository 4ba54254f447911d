//! Elasticsearch query DSL rendering and response parsing.

use serde_json::{Map, Value, json};
use time::{Date, macros::format_description};

use audit_domain::query::{AggregationRequest, BoostedField, Query, SearchRequest};

use crate::{Bucket, Error, RawHit, Result, SearchHits};

/// Characters with meaning in `query_string` syntax.
const QUERY_STRING_RESERVED: &[char] = &[
	'+', '-', '=', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':',
	'\\', '/',
];

pub fn render_query(query: &Query, analyzer: Option<&str>) -> Value {
	match query {
		Query::MatchAll => json!({ "match_all": {} }),
		Query::MultiMatch { text, fields } => {
			let mut body = Map::new();

			body.insert("query".to_string(), Value::String(text.clone()));
			body.insert(
				"fields".to_string(),
				Value::Array(fields.iter().map(|field| Value::String(field_spec(field))).collect()),
			);
			body.insert("type".to_string(), Value::String("best_fields".to_string()));

			if let Some(analyzer) = analyzer {
				body.insert("analyzer".to_string(), Value::String(analyzer.to_string()));
			}

			json!({ "multi_match": body })
		},
		Query::Term { field, value } => json!({ "term": { *field: value } }),
		Query::Contains { field, value } => json!({
			"query_string": {
				"query": format!("*{}*", escape_query_string(value)),
				"fields": [field],
				"analyze_wildcard": true,
			}
		}),
		Query::Wildcard { field, pattern } => json!({ "wildcard": { *field: { "value": pattern } } }),
		Query::DateRange { field, from, to } => {
			let mut bounds = Map::new();

			if let Some(from) = from {
				bounds.insert("gte".to_string(), Value::String(format_date(*from)));
			}
			// Rounded up so the whole `to` day is included.
			if let Some(to) = to {
				bounds.insert("lte".to_string(), Value::String(format!("{}||/d", format_date(*to))));
			}

			json!({ "range": { *field: bounds } })
		},
		Query::Bool { must, filter } => {
			let mut body = Map::new();

			if !must.is_empty() {
				body.insert("must".to_string(), render_all(must, analyzer));
			}
			if !filter.is_empty() {
				body.insert("filter".to_string(), render_all(filter, analyzer));
			}

			json!({ "bool": body })
		},
	}
}

pub fn search_body(request: &SearchRequest, analyzer: Option<&str>) -> Value {
	json!({
		"query": render_query(&request.query, analyzer),
		"from": request.from,
		"size": request.size,
		"sort": [{ request.sort.field: { "order": request.sort.order.as_str() } }],
		"track_total_hits": true,
	})
}

pub fn aggregation_body(request: &AggregationRequest) -> Value {
	let query = if request.filter.is_empty() {
		Query::MatchAll
	} else {
		Query::Bool { must: Vec::new(), filter: request.filter.clone() }
	};

	json!({
		"size": 0,
		"query": render_query(&query, None),
		"aggs": {
			request.name(): {
				"terms": { "field": request.field, "size": request.bucket_limit }
			}
		},
	})
}

pub fn parse_search_response(json: Value) -> Result<SearchHits> {
	let hits = json
		.get("hits")
		.ok_or_else(|| invalid("Search response is missing hits."))?;
	let total = match hits.get("total") {
		Some(Value::Number(number)) => number.as_u64(),
		Some(total) => total.get("value").and_then(Value::as_u64),
		None => None,
	}
	.ok_or_else(|| invalid("Search response is missing hits.total."))?;
	let items = hits
		.get("hits")
		.and_then(Value::as_array)
		.ok_or_else(|| invalid("Search response is missing hits.hits array."))?;
	let mut parsed = Vec::with_capacity(items.len());

	for item in items {
		let id = item.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
		let source = item
			.get("_source")
			.filter(|source| source.is_object())
			.cloned()
			.ok_or_else(|| invalid(format!("Search hit {id:?} has no _source object.")))?;

		parsed.push(RawHit { id, source });
	}

	Ok(SearchHits { hits: parsed, total })
}

pub fn parse_aggregation_response(json: Value, name: &str) -> Result<Vec<Bucket>> {
	let buckets = json
		.get("aggregations")
		.and_then(|aggs| aggs.get(name))
		.and_then(|agg| agg.get("buckets"))
		.and_then(Value::as_array)
		.ok_or_else(|| invalid(format!("Aggregation response is missing {name}.buckets.")))?;
	let mut parsed = Vec::with_capacity(buckets.len());

	for bucket in buckets {
		let key = match bucket.get("key_as_string").or_else(|| bucket.get("key")) {
			Some(Value::String(key)) => key.clone(),
			Some(key @ (Value::Number(_) | Value::Bool(_))) => key.to_string(),
			_ => return Err(invalid("Aggregation bucket has no scalar key.")),
		};
		let doc_count = bucket
			.get("doc_count")
			.and_then(Value::as_u64)
			.ok_or_else(|| invalid(format!("Aggregation bucket {key:?} has no doc_count.")))?;

		parsed.push(Bucket { key, doc_count });
	}

	Ok(parsed)
}

fn render_all(queries: &[Query], analyzer: Option<&str>) -> Value {
	Value::Array(queries.iter().map(|query| render_query(query, analyzer)).collect())
}

fn field_spec(field: &BoostedField) -> String {
	match field.boost {
		Some(boost) => format!("{}^{boost}", field.name),
		None => field.name.to_string(),
	}
}

fn format_date(date: Date) -> String {
	date.format(format_description!("[year]-[month]-[day]")).unwrap_or_else(|_| date.to_string())
}

/// `<` and `>` cannot be escaped in `query_string`, so they are dropped.
fn escape_query_string(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len() * 2);

	for ch in raw.chars() {
		if ch == '<' || ch == '>' {
			continue;
		}
		if QUERY_STRING_RESERVED.contains(&ch) {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

fn invalid(message: impl Into<String>) -> Error {
	Error::InvalidResponse { message: message.into() }
}
