mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Elasticsearch, Indices, Security, Service, Stats};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let url = cfg.elasticsearch.url.trim();

	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "elasticsearch.url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.elasticsearch.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "elasticsearch.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.elasticsearch.username.is_some() != cfg.elasticsearch.password.is_some() {
		return Err(Error::Validation {
			message: "elasticsearch.username and elasticsearch.password must be set together."
				.to_string(),
		});
	}
	if cfg.elasticsearch.username.is_some() && cfg.elasticsearch.api_key.is_some() {
		return Err(Error::Validation {
			message: "elasticsearch.api_key cannot be combined with basic auth.".to_string(),
		});
	}

	for (label, value) in
		[("indices.requests", &cfg.indices.requests), ("indices.methods", &cfg.indices.methods)]
	{
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.indices.requests == cfg.indices.methods {
		return Err(Error::Validation {
			message: "indices.requests and indices.methods must name different indices."
				.to_string(),
		});
	}
	if cfg.stats.request_bucket_limit == 0 {
		return Err(Error::Validation {
			message: "stats.request_bucket_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.stats.method_bucket_limit == 0 {
		return Err(Error::Validation {
			message: "stats.method_bucket_limit must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let es = &mut cfg.elasticsearch;

	es.url = es.url.trim().trim_end_matches('/').to_string();

	for value in
		[&mut es.username, &mut es.password, &mut es.api_key, &mut es.full_text_analyzer]
	{
		if value.as_deref().map(|raw| raw.trim().is_empty()).unwrap_or(false) {
			*value = None;
		}
	}
}
