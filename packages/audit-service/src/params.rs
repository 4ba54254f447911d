//! Paging parameters that fall back to their defaults when sent blank, as in `?page=&size=`.

use serde::{Deserialize, Deserializer, de::Error as _};

use audit_domain::query::Page;

pub(crate) fn page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	number_or(deserializer, 0)
}

pub(crate) fn size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	number_or(deserializer, Page::DEFAULT_SIZE)
}

pub(crate) fn default_size() -> u32 {
	Page::DEFAULT_SIZE
}

fn number_or<'de, D>(deserializer: D, fallback: u32) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	let raw = raw.trim();

	if raw.is_empty() {
		return Ok(fallback);
	}

	raw.parse().map_err(D::Error::custom)
}
