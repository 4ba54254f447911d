//! HTTP request/response audit records and their routers.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	AuditRecord, Error, Result,
	query::{AggregationRequest, BoostedField, Query},
	routing::{self, Presence, Route},
};

pub const URI: &str = "uri";
pub const URI_KEYWORD: &str = "uri.keyword";
pub const METHOD: &str = "method";
pub const DIRECTION: &str = "direction";
pub const STATUS_CODE: &str = "statusCode";
pub const REQUEST_BODY: &str = "requestBody";
pub const RESPONSE_BODY: &str = "responseBody";

pub const FULL_TEXT_FIELDS: [BoostedField; 3] = [
	BoostedField::boosted(URI, 2),
	BoostedField::plain(REQUEST_BODY),
	BoostedField::plain(RESPONSE_BODY),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
	Incoming,
	Outgoing,
}
impl Direction {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Incoming => "INCOMING",
			Self::Outgoing => "OUTGOING",
		}
	}

	pub fn from_param(value: &str) -> Result<Self> {
		match value {
			"INCOMING" => Ok(Self::Incoming),
			"OUTGOING" => Ok(Self::Outgoing),
			_ => Err(Error::UnknownValue {
				field: "direction",
				value: value.to_string(),
				expected: "INCOMING, OUTGOING",
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRecord {
	#[serde(default, deserialize_with = "crate::id_or_empty")]
	pub id: String,
	#[serde(default, with = "crate::time_serde::option")]
	pub timestamp: Option<OffsetDateTime>,
	pub uri: Option<String>,
	pub method: Option<String>,
	pub direction: Option<Direction>,
	pub status_code: Option<String>,
	pub request_body: Option<String>,
	pub response_body: Option<String>,
}
impl AuditRecord for TrafficRecord {
	fn id_mut(&mut self) -> &mut String {
		&mut self.id
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrafficGroupBy {
	#[default]
	StatusCode,
	Method,
	Uri,
}
impl TrafficGroupBy {
	/// Unrecognized or missing values fall back to `statusCode` rather than failing.
	pub fn from_param(value: Option<&str>) -> Self {
		match value {
			Some("statusCode") | None => Self::StatusCode,
			Some("method") => Self::Method,
			Some("uri") => Self::Uri,
			Some(other) => {
				tracing::debug!(group_by = other, "Unknown groupBy; using statusCode.");

				Self::StatusCode
			},
		}
	}

	pub fn field(self) -> &'static str {
		match self {
			Self::StatusCode => STATUS_CODE,
			Self::Method => METHOD,
			Self::Uri => URI_KEYWORD,
		}
	}
}

/// Full-text search over URI (boosted) and both bodies, optionally narrowed to one status code.
pub fn route_text_search(query: Option<&str>, status_code: Option<&str>) -> Route {
	routing::full_text(query, status_code.map(|value| (STATUS_CODE, value)), &FULL_TEXT_FIELDS)
}

/// Field search over URI, method, and status code.
///
/// URI matches by substring unless it holds a glob, in which case the unanalyzed
/// `uri.keyword` is matched against the whole pattern. Method is a keyword, so its literal form
/// is an exact term.
pub fn route_field_search(
	uri: Option<&str>,
	method: Option<&str>,
	status_code: Option<&str>,
) -> Route {
	let uri = routing::non_blank(uri);
	let method = routing::non_blank(method);
	let status_code = routing::non_blank(status_code);
	let presence = Presence::of([uri, method, status_code]);
	let predicates = [
		uri.map(|value| {
			routing::glob_or(value, URI_KEYWORD, |value| Query::Contains { field: URI, value })
		}),
		method.map(|value| {
			routing::glob_or(value, METHOD, |value| Query::Term { field: METHOD, value })
		}),
		status_code.map(|value| Query::Term { field: STATUS_CODE, value: value.to_string() }),
	];

	routing::field_search(presence, predicates)
}

pub fn stats_request(
	index: &str,
	group_by: TrafficGroupBy,
	direction: Option<Direction>,
	bucket_limit: u32,
) -> AggregationRequest {
	let filter = direction
		.map(|direction| Query::Term { field: DIRECTION, value: direction.as_str().to_string() })
		.into_iter()
		.collect();

	AggregationRequest { index: index.to_string(), filter, field: group_by.field(), bucket_limit }
}
