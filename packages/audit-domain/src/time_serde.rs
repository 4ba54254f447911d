//! Timestamps as stored by the ingestion side.
//!
//! Documents carry either RFC 3339 strings, zone-less local date-times (read as UTC), or epoch
//! milliseconds. Output is always RFC 3339.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
	Text(String),
	Millis(i64),
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	match RawTimestamp::deserialize(deserializer)? {
		RawTimestamp::Text(raw) => parse(&raw).map_err(serde::de::Error::custom),
		RawTimestamp::Millis(millis) =>
			OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
				.map_err(serde::de::Error::custom),
	}
}

pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
	if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(value);
	}

	let local = format_description!(
		"[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
	);

	PrimitiveDateTime::parse(raw, local).map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn parses_each_stored_form() {
		assert_eq!(parse("2025-01-15T10:30:00Z").unwrap(), datetime!(2025-01-15 10:30:00 UTC));
		assert_eq!(
			parse("2025-01-15T10:30:00+02:00").unwrap(),
			datetime!(2025-01-15 08:30:00 UTC)
		);
		assert_eq!(parse("2025-01-15T10:30:00").unwrap(), datetime!(2025-01-15 10:30:00 UTC));
		assert_eq!(
			parse("2025-01-15T10:30:00.125").unwrap(),
			datetime!(2025-01-15 10:30:00.125 UTC)
		);
		assert!(parse("15/01/2025").is_err());
	}
}
