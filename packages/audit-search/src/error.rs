pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search backend timed out: {message}")]
	Timeout { message: String },
	#[error("Search backend is unreachable: {message}")]
	Unavailable { message: String },
	#[error("Search backend answered HTTP {status}: {body}")]
	Status { status: u16, body: String },
	#[error("Search backend transport error: {0}")]
	Transport(reqwest::Error),
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout { message: err.to_string() }
		} else if err.is_connect() {
			Self::Unavailable { message: err.to_string() }
		} else if err.is_decode() {
			Self::InvalidResponse { message: err.to_string() }
		} else {
			Self::Transport(err)
		}
	}
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
	fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
		Self::InvalidConfig { message: format!("Invalid Elasticsearch credential header: {err}.") }
	}
}
