use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file {}.", path.display())]
	ReadConfig { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse config file {}: {source}", path.display())]
	ParseConfig { path: PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
