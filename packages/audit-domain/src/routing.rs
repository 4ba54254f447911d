//! Presence-driven query selection shared by both record kinds.

use std::fmt;

use crate::query::{BoostedField, Query};

/// Returns the value when it carries at least one non-whitespace character.
///
/// Blank and absent parameters are indistinguishable to every router.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
	value.filter(|raw| !raw.trim().is_empty())
}

/// A value is a glob pattern when it contains `*` or `?`. There is no escape syntax.
pub fn is_wildcard_pattern(value: &str) -> bool {
	value.contains(['*', '?'])
}

/// Bit set over a router's optional inputs, bit `i` set when input `i` is non-blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Presence {
	bits: u8,
	width: u8,
}
impl Presence {
	pub fn of<const N: usize>(values: [Option<&str>; N]) -> Self {
		let bits = values
			.iter()
			.enumerate()
			.filter(|(_, value)| non_blank(**value).is_some())
			.fold(0_u8, |bits, (slot, _)| bits | (1 << slot));

		Self { bits, width: N as u8 }
	}

	pub fn bits(self) -> u8 {
		self.bits
	}
}
impl fmt::Display for Presence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:0width$b}", self.bits, width = usize::from(self.width))
	}
}

/// The query chosen for one request together with the presence mask that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
	pub presence: Presence,
	pub query: Query,
}

/// Four-way full-text dispatch: text with filter, text only, filter only, or everything.
pub(crate) fn full_text(
	text: Option<&str>,
	filter: Option<(&'static str, &str)>,
	fields: &[BoostedField],
) -> Route {
	let text = non_blank(text);
	let filter = filter.and_then(|(field, value)| non_blank(Some(value)).map(|v| (field, v)));
	let presence = Presence::of([text, filter.map(|(_, value)| value)]);
	let multi_match =
		|text: &str| Query::MultiMatch { text: text.to_string(), fields: fields.to_vec() };
	let term = |field: &'static str, value: &str| Query::Term { field, value: value.to_string() };
	let query = match (text, filter) {
		(Some(text), Some((field, value))) =>
			Query::Bool { must: vec![multi_match(text)], filter: vec![term(field, value)] },
		(Some(text), None) => multi_match(text),
		(None, Some((field, value))) => term(field, value),
		(None, None) => Query::MatchAll,
	};

	tracing::debug!(%presence, shape = query.kind(), "Routed full-text search.");

	Route { presence, query }
}

/// Predicate for a field that may carry a glob: wildcard on the unanalyzed field, otherwise the
/// literal form.
pub(crate) fn glob_or(
	value: &str,
	wildcard_field: &'static str,
	literal: impl FnOnce(String) -> Query,
) -> Query {
	if is_wildcard_pattern(value) {
		Query::Wildcard { field: wildcard_field, pattern: value.to_string() }
	} else {
		literal(value.to_string())
	}
}

/// Conjunction over whichever field predicates are present; all eight combinations of three
/// inputs land on exactly one shape.
pub(crate) fn field_search(presence: Presence, predicates: [Option<Query>; 3]) -> Route {
	let query = Query::all_of(predicates.into_iter().flatten().collect());

	tracing::debug!(%presence, shape = query.kind(), "Routed field search.");

	Route { presence, query }
}
