use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use audit_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn with_section(section: &str, entries: &[(&str, Value)]) -> String {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Template config must be a table.");
	let table = root
		.entry(section.to_string())
		.or_insert(Value::Table(Default::default()))
		.as_table_mut()
		.expect("Config section must be a table.");

	for (key, entry) in entries {
		table.insert(key.to_string(), entry.clone());
	}

	toml::to_string(&value).expect("Failed to render template config.")
}

fn without_section(section: &str) -> String {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Template config must be a table.");

	root.remove(section);

	toml::to_string(&value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("audit_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> audit_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = audit_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(payload: String, expected: &str) {
	let err = load_payload(payload).expect_err("Expected validation error.");

	assert!(matches!(err, Error::Validation { .. }), "Unexpected error kind: {err:?}");

	let message = err.to_string();

	assert!(message.contains(expected), "Unexpected error message: {message}");
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config must be valid.");

	assert_eq!(cfg.elasticsearch.url, "http://127.0.0.1:9200");
	assert_eq!(cfg.elasticsearch.full_text_analyzer.as_deref(), Some("audit_analyzer"));
	assert_eq!(cfg.indices.requests, "audit-requests");
	assert_eq!(cfg.indices.methods, "audit-methods");
	assert_eq!(cfg.stats.request_bucket_limit, 100);
	assert_eq!(cfg.stats.method_bucket_limit, 10);
	assert!(cfg.security.bind_localhost_only);
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let mut value = sample_value();
	let root = value.as_table_mut().expect("Template config must be a table.");

	root.remove("indices");
	root.remove("stats");
	root.remove("security");

	let cfg = load_payload(toml::to_string(&value).expect("Failed to render config."))
		.expect("Config without optional sections must be valid.");

	assert_eq!(cfg.indices.requests, "audit-requests");
	assert_eq!(cfg.indices.methods, "audit-methods");
	assert_eq!(cfg.stats.request_bucket_limit, 100);
	assert_eq!(cfg.stats.method_bucket_limit, 10);
	assert!(cfg.security.bind_localhost_only);
}

#[test]
fn missing_elasticsearch_section_is_a_parse_error() {
	let err = load_payload(without_section("elasticsearch")).expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn missing_file_is_a_read_error() {
	let mut path = env::temp_dir();

	path.push("audit_config_test_does_not_exist.toml");

	let err = audit_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error kind: {err:?}");
}

#[test]
fn url_must_have_http_scheme() {
	expect_validation(
		with_section("elasticsearch", &[("url", Value::String("localhost:9200".to_string()))]),
		"elasticsearch.url must start with http:// or https://.",
	);
}

#[test]
fn timeout_must_be_positive() {
	expect_validation(
		with_section("elasticsearch", &[("timeout_ms", Value::Integer(0))]),
		"elasticsearch.timeout_ms must be greater than zero.",
	);
}

#[test]
fn basic_auth_requires_both_parts() {
	expect_validation(
		with_section("elasticsearch", &[("username", Value::String("elastic".to_string()))]),
		"elasticsearch.username and elasticsearch.password must be set together.",
	);
}

#[test]
fn blank_password_counts_as_missing() {
	expect_validation(
		with_section(
			"elasticsearch",
			&[
				("username", Value::String("elastic".to_string())),
				("password", Value::String("   ".to_string())),
			],
		),
		"elasticsearch.username and elasticsearch.password must be set together.",
	);
}

#[test]
fn api_key_excludes_basic_auth() {
	expect_validation(
		with_section(
			"elasticsearch",
			&[
				("username", Value::String("elastic".to_string())),
				("password", Value::String("changeme".to_string())),
				("api_key", Value::String("a2V5".to_string())),
			],
		),
		"elasticsearch.api_key cannot be combined with basic auth.",
	);
}

#[test]
fn index_names_must_be_non_empty() {
	expect_validation(
		with_section("indices", &[("methods", Value::String(" ".to_string()))]),
		"indices.methods must be non-empty.",
	);
}

#[test]
fn index_names_must_differ() {
	expect_validation(
		with_section("indices", &[("methods", Value::String("audit-requests".to_string()))]),
		"indices.requests and indices.methods must name different indices.",
	);
}

#[test]
fn bucket_limits_must_be_positive() {
	expect_validation(
		with_section("stats", &[("request_bucket_limit", Value::Integer(0))]),
		"stats.request_bucket_limit must be greater than zero.",
	);
	expect_validation(
		with_section("stats", &[("method_bucket_limit", Value::Integer(0))]),
		"stats.method_bucket_limit must be greater than zero.",
	);
}

#[test]
fn blank_analyzer_is_dropped() {
	let cfg = load_payload(with_section(
		"elasticsearch",
		&[("full_text_analyzer", Value::String(String::new()))],
	))
	.expect("Blank analyzer must be accepted.");

	assert!(cfg.elasticsearch.full_text_analyzer.is_none());
}
