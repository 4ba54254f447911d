use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub elasticsearch: Elasticsearch,
	#[serde(default)]
	pub indices: Indices,
	#[serde(default)]
	pub stats: Stats,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Elasticsearch {
	pub url: String,
	pub timeout_ms: u64,
	/// Optional. Basic auth user; requires `password`.
	pub username: Option<String>,
	pub password: Option<String>,
	/// Optional. Sent as `Authorization: ApiKey <key>`; exclusive with basic auth.
	pub api_key: Option<String>,
	/// Optional. Search-time analyzer for full-text queries; must exist in both indices.
	pub full_text_analyzer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Indices {
	pub requests: String,
	pub methods: String,
}
impl Default for Indices {
	fn default() -> Self {
		Self { requests: "audit-requests".to_string(), methods: "audit-methods".to_string() }
	}
}

/// Terms-aggregation bucket caps, one per record kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Stats {
	pub request_bucket_limit: u32,
	pub method_bucket_limit: u32,
}
impl Default for Stats {
	fn default() -> Self {
		Self { request_bucket_limit: 100, method_bucket_limit: 10 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}
