pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { field: String, message: String },
	#[error("Search backend timed out: {message}")]
	BackendTimeout { message: String },
	#[error("Search backend unavailable: {message}")]
	BackendUnavailable { message: String },
	#[error("Search failed: {message}")]
	SearchFailed { message: String },
}
impl From<audit_domain::Error> for Error {
	fn from(err: audit_domain::Error) -> Self {
		Self::InvalidRequest { field: err.field().to_string(), message: err.to_string() }
	}
}

impl From<audit_search::Error> for Error {
	fn from(err: audit_search::Error) -> Self {
		match err {
			audit_search::Error::Timeout { message } => Self::BackendTimeout { message },
			audit_search::Error::Unavailable { message } => Self::BackendUnavailable { message },
			other => Self::SearchFailed { message: other.to_string() },
		}
	}
}
