//! Intercepted method-call audit records and their routers.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, macros::format_description};

use crate::{
	AuditRecord, Error, Result,
	query::{AggregationRequest, BoostedField, Query, TIMESTAMP_FIELD},
	routing::{self, Presence, Route},
};

pub const METHOD: &str = "method";
pub const METHOD_KEYWORD: &str = "method.keyword";
pub const LEVEL: &str = "level";
pub const EVENT_TYPE: &str = "eventType";
pub const ARGS: &str = "args";
pub const RESULT: &str = "result";

pub const FULL_TEXT_FIELDS: [BoostedField; 3] =
	[BoostedField::boosted(METHOD, 2), BoostedField::plain(ARGS), BoostedField::plain(RESULT)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
	Debug,
	Info,
	Warn,
	Error,
}
impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Debug => "DEBUG",
			Self::Info => "INFO",
			Self::Warn => "WARN",
			Self::Error => "ERROR",
		}
	}

	/// `field` is the parameter name used in the error, since callers spell it differently per
	/// endpoint.
	pub fn from_param(field: &'static str, value: &str) -> Result<Self> {
		match value {
			"DEBUG" => Ok(Self::Debug),
			"INFO" => Ok(Self::Info),
			"WARN" => Ok(Self::Warn),
			"ERROR" => Ok(Self::Error),
			_ => Err(Error::UnknownValue {
				field,
				value: value.to_string(),
				expected: "DEBUG, INFO, WARN, ERROR",
			}),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
	Start,
	End,
	Error,
}
impl EventType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Start => "START",
			Self::End => "END",
			Self::Error => "ERROR",
		}
	}

	pub fn from_param(value: &str) -> Result<Self> {
		match value {
			"START" => Ok(Self::Start),
			"END" => Ok(Self::End),
			"ERROR" => Ok(Self::Error),
			_ => Err(Error::UnknownValue {
				field: "eventType",
				value: value.to_string(),
				expected: "START, END, ERROR",
			}),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
	#[serde(default, deserialize_with = "crate::id_or_empty")]
	pub id: String,
	#[serde(default, with = "crate::time_serde::option")]
	pub timestamp: Option<OffsetDateTime>,
	pub method: Option<String>,
	pub level: Option<LogLevel>,
	pub event_type: Option<EventType>,
	pub correlation_id: Option<String>,
	pub args: Option<String>,
	pub result: Option<String>,
	pub error_message: Option<String>,
}
impl AuditRecord for CallRecord {
	fn id_mut(&mut self) -> &mut String {
		&mut self.id
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MethodGroupBy {
	#[default]
	Level,
	Method,
}
impl MethodGroupBy {
	/// Only `level` selects the level field; every other value groups by method name.
	pub fn from_param(value: Option<&str>) -> Self {
		match value {
			Some("level") | None => Self::Level,
			Some("method") => Self::Method,
			Some(other) => {
				tracing::debug!(group_by = other, "Unknown groupBy; grouping by method.keyword.");

				Self::Method
			},
		}
	}

	pub fn field(self) -> &'static str {
		match self {
			Self::Level => LEVEL,
			Self::Method => METHOD_KEYWORD,
		}
	}
}

/// Calendar-day window on the call timestamp; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
	pub from: Option<Date>,
	pub to: Option<Date>,
}
impl DateWindow {
	pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
		Ok(Self { from: parse_date("from", from)?, to: parse_date("to", to)? })
	}

	pub fn is_open(self) -> bool {
		self.from.is_none() && self.to.is_none()
	}

	fn filter(self) -> Option<Query> {
		(!self.is_open()).then_some(Query::DateRange {
			field: TIMESTAMP_FIELD,
			from: self.from,
			to: self.to,
		})
	}
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<Date>> {
	let Some(value) = routing::non_blank(value) else {
		return Ok(None);
	};
	let format = format_description!("[year]-[month]-[day]");

	Date::parse(value.trim(), format)
		.map(Some)
		.map_err(|_| Error::InvalidDate { field, value: value.to_string() })
}

/// Full-text search over method name (boosted), arguments, and result, optionally narrowed to
/// one level.
pub fn route_text_search(query: Option<&str>, level: Option<LogLevel>) -> Route {
	routing::full_text(query, level.map(|level| (LEVEL, level.as_str())), &FULL_TEXT_FIELDS)
}

/// Field search over method name, level, and event type.
///
/// The method name matches by substring unless it holds a glob, in which case `method.keyword`
/// is matched against the whole pattern.
pub fn route_field_search(
	method: Option<&str>,
	level: Option<LogLevel>,
	event_type: Option<EventType>,
) -> Route {
	let method = routing::non_blank(method);
	let level = level.map(LogLevel::as_str);
	let event_type = event_type.map(EventType::as_str);
	let presence = Presence::of([method, level, event_type]);
	let predicates = [
		method.map(|value| {
			routing::glob_or(value, METHOD_KEYWORD, |value| Query::Contains {
				field: METHOD,
				value,
			})
		}),
		level.map(|value| Query::Term { field: LEVEL, value: value.to_string() }),
		event_type.map(|value| Query::Term { field: EVENT_TYPE, value: value.to_string() }),
	];

	routing::field_search(presence, predicates)
}

/// Explicit bucket limit; the engine's implicit default is never relied upon.
pub fn stats_request(
	index: &str,
	group_by: MethodGroupBy,
	window: DateWindow,
	bucket_limit: u32,
) -> AggregationRequest {
	AggregationRequest {
		index: index.to_string(),
		filter: window.filter().into_iter().collect(),
		field: group_by.field(),
		bucket_limit,
	}
}
