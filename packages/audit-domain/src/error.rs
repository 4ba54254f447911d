pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("{field} must be one of {expected}; got {value:?}.")]
	UnknownValue { field: &'static str, value: String, expected: &'static str },
	#[error("{field} must be an ISO-8601 date (YYYY-MM-DD); got {value:?}.")]
	InvalidDate { field: &'static str, value: String },
}
impl Error {
	/// Name of the offending parameter as callers spell it.
	pub fn field(&self) -> &'static str {
		match self {
			Self::UnknownValue { field, .. } | Self::InvalidDate { field, .. } => field,
		}
	}
}
