//! Backend-neutral query model.
//!
//! Routers produce these values; the search gateway renders them into the engine's DSL. Field
//! names are the indexed names, including `.keyword` sub-fields where the unanalyzed form is
//! required.

use time::Date;

pub const TIMESTAMP_FIELD: &str = "timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostedField {
	pub name: &'static str,
	pub boost: Option<u32>,
}
impl BoostedField {
	pub const fn plain(name: &'static str) -> Self {
		Self { name, boost: None }
	}

	pub const fn boosted(name: &'static str, boost: u32) -> Self {
		Self { name, boost: Some(boost) }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
	MatchAll,
	/// Relevance-scored text match across several analyzed fields.
	MultiMatch { text: String, fields: Vec<BoostedField> },
	/// Exact value against an unanalyzed field.
	Term { field: &'static str, value: String },
	/// Substring match against an analyzed field.
	Contains { field: &'static str, value: String },
	/// Case-sensitive glob (`*`, `?`) over the whole unanalyzed value.
	Wildcard { field: &'static str, pattern: String },
	/// Inclusive by calendar day on both ends.
	DateRange { field: &'static str, from: Option<Date>, to: Option<Date> },
	Bool { must: Vec<Query>, filter: Vec<Query> },
}
impl Query {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::MatchAll => "match_all",
			Self::MultiMatch { .. } => "multi_match",
			Self::Term { .. } => "term",
			Self::Contains { .. } => "contains",
			Self::Wildcard { .. } => "wildcard",
			Self::DateRange { .. } => "date_range",
			Self::Bool { .. } => "bool",
		}
	}

	/// Conjunction of the given predicates, collapsing the trivial cases.
	pub fn all_of(mut predicates: Vec<Query>) -> Self {
		match predicates.len() {
			0 => Self::MatchAll,
			1 => predicates.remove(0),
			_ => Self::Bool { must: predicates, filter: Vec::new() },
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	Desc,
}
impl SortOrder {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
	pub field: &'static str,
	pub order: SortOrder,
}
impl Sort {
	pub const fn newest_first() -> Self {
		Self { field: TIMESTAMP_FIELD, order: SortOrder::Desc }
	}
}

/// Zero-based page index and page length as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	pub number: u32,
	pub size: u32,
}
impl Page {
	pub const DEFAULT_SIZE: u32 = 10;

	pub const fn new(number: u32, size: u32) -> Self {
		Self { number, size }
	}

	pub fn offset(self) -> u64 {
		u64::from(self.number) * u64::from(self.size)
	}
}
impl Default for Page {
	fn default() -> Self {
		Self { number: 0, size: Self::DEFAULT_SIZE }
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
	pub index: String,
	pub query: Query,
	pub from: u64,
	pub size: u32,
	pub sort: Sort,
}
impl SearchRequest {
	pub fn paged(index: impl Into<String>, query: Query, page: Page) -> Self {
		Self {
			index: index.into(),
			query,
			from: page.offset(),
			size: page.size,
			sort: Sort::newest_first(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationRequest {
	pub index: String,
	/// Non-scoring pre-filters; empty means every document.
	pub filter: Vec<Query>,
	pub field: &'static str,
	pub bucket_limit: u32,
}
impl AggregationRequest {
	pub fn name(&self) -> String {
		format!("{}_stats", self.field)
	}
}
