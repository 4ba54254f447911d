use std::{collections::BTreeSet, sync::Arc};

use serde_json::{Value, json};

use audit_domain::query::Query;
use audit_service::{
	AuditService, Error, MethodFieldQuery, MethodSearchQuery, MethodStatsQuery,
	RequestFieldQuery, RequestSearchQuery, RequestStatsQuery,
};
use audit_testkit::{Failure, InMemoryBackend};

const REQUESTS: &str = "audit-requests";
const METHODS: &str = "audit-methods";

fn test_config() -> audit_config::Config {
	audit_config::Config {
		service: audit_config::Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "debug".to_string(),
		},
		elasticsearch: audit_config::Elasticsearch {
			url: "http://127.0.0.1:9200".to_string(),
			timeout_ms: 1_000,
			username: None,
			password: None,
			api_key: None,
			full_text_analyzer: None,
		},
		indices: audit_config::Indices::default(),
		stats: audit_config::Stats::default(),
		security: audit_config::Security::default(),
	}
}

fn service_with(backend: Arc<InMemoryBackend>) -> AuditService {
	AuditService::with_backend(test_config(), backend)
}

fn traffic(id: &str, timestamp: &str, uri: &str, method: &str, status: &str) -> Value {
	json!({
		"id": id,
		"timestamp": timestamp,
		"uri": uri,
		"method": method,
		"direction": "INCOMING",
		"statusCode": status,
		"requestBody": "",
		"responseBody": format!("{{\"path\": \"{uri}\"}}"),
	})
}

fn call(id: &str, timestamp: &str, method: &str, level: &str, event_type: &str) -> Value {
	json!({
		"id": id,
		"timestamp": timestamp,
		"method": method,
		"level": level,
		"eventType": event_type,
		"correlationId": "c-1",
		"args": "[{name: 'John'}]",
		"result": null,
	})
}

fn seeded_traffic() -> Arc<InMemoryBackend> {
	let backend = Arc::new(InMemoryBackend::new());

	backend.seed(REQUESTS, [
		traffic("r1", "2025-01-15T10:00:00", "/api/orders", "GET", "200"),
		traffic("r2", "2025-01-15T11:00:00", "/api/users/123", "POST", "404"),
		traffic("r3", "2025-01-15T12:00:00", "/api/orders/9", "GET", "200"),
	]);

	backend
}

fn seeded_calls() -> Arc<InMemoryBackend> {
	let backend = Arc::new(InMemoryBackend::new());

	backend.seed(METHODS, [
		call("m1", "2025-01-15T10:00:00", "getUserById", "INFO", "START"),
		call("m2", "2025-01-15T11:00:00", "Service.createUser", "ERROR", "END"),
		call("m3", "2025-02-01T09:00:00", "UserService.updateUser", "INFO", "END"),
	]);

	backend
}

fn search_query(query: Option<&str>, status_code: Option<&str>) -> RequestSearchQuery {
	RequestSearchQuery {
		query: query.map(str::to_string),
		status_code: status_code.map(str::to_string),
		page: 0,
		size: 10,
	}
}

fn field_query(method: Option<&str>, log_level: Option<&str>) -> MethodFieldQuery {
	MethodFieldQuery {
		method: method.map(str::to_string),
		log_level: log_level.map(str::to_string),
		event_type: None,
		page: 0,
		size: 10,
	}
}

#[tokio::test]
async fn status_filter_and_stats_agree_on_seeded_traffic() {
	let service = service_with(seeded_traffic());
	let found =
		service.search_requests(search_query(None, Some("200"))).await.expect("Search failed.");

	assert_eq!(found.total_hits, 2);
	assert_eq!(found.results.len(), 2);
	assert!(found.results.iter().all(|record| record.status_code.as_deref() == Some("200")));

	let stats =
		service.request_stats(RequestStatsQuery::default()).await.expect("Stats failed.");

	assert_eq!(stats.stats.len(), 2);
	assert_eq!(stats.stats.get("200"), Some(&2));
	assert_eq!(stats.stats.get("404"), Some(&1));
}

#[tokio::test]
async fn results_are_newest_first() {
	let service = service_with(seeded_traffic());
	let found = service.search_requests(search_query(None, None)).await.expect("Search failed.");
	let ids = found.results.iter().map(|record| record.id.as_str()).collect::<Vec<_>>();

	assert_eq!(ids, vec!["r3", "r2", "r1"]);
	assert_eq!(found.total_hits, 3);
}

#[tokio::test]
async fn full_text_narrows_by_status() {
	let service = service_with(seeded_traffic());
	let found =
		service.search_requests(search_query(Some("orders"), None)).await.expect("Search failed.");

	assert_eq!(found.total_hits, 2);

	let found = service
		.search_requests(search_query(Some("users"), Some("200")))
		.await
		.expect("Search failed.");

	assert_eq!(found.total_hits, 0);
	assert!(found.results.is_empty());
}

#[tokio::test]
async fn uri_substring_and_glob_field_search() {
	let backend = seeded_traffic();
	let service = service_with(backend.clone());
	let by_substring = service
		.find_requests(RequestFieldQuery {
			uri: Some("/api/orders".to_string()),
			method: None,
			status_code: None,
			page: 0,
			size: 10,
		})
		.await
		.expect("Search failed.");

	assert_eq!(by_substring.total_hits, 2);

	let by_glob = service
		.find_requests(RequestFieldQuery {
			uri: Some("/api/users/*".to_string()),
			method: Some("POST".to_string()),
			status_code: Some("404".to_string()),
			page: 0,
			size: 10,
		})
		.await
		.expect("Search failed.");

	assert_eq!(by_glob.total_hits, 1);
	assert_eq!(by_glob.results[0].id, "r2");

	let searches = backend.searches();
	let Query::Bool { must, .. } = &searches[1].query else {
		panic!("Expected a conjunction, got {:?}.", searches[1].query);
	};

	assert_eq!(must.len(), 3);
	assert_eq!(must[0].kind(), "wildcard");
}

#[tokio::test]
async fn method_glob_matches_service_methods_only() {
	let service = service_with(seeded_calls());
	let found =
		service.find_methods(field_query(Some("*Service.*"), None)).await.expect("Search failed.");
	let methods = found
		.results
		.iter()
		.filter_map(|record| record.method.as_deref())
		.collect::<BTreeSet<_>>();

	assert_eq!(methods, BTreeSet::from(["Service.createUser", "UserService.updateUser"]));
	assert_eq!(found.total_hits, 2);
}

#[tokio::test]
async fn method_field_search_combines_level_and_event_type() {
	let service = service_with(seeded_calls());
	let found = service
		.find_methods(MethodFieldQuery {
			method: Some("User".to_string()),
			log_level: Some("INFO".to_string()),
			event_type: Some("END".to_string()),
			page: 0,
			size: 10,
		})
		.await
		.expect("Search failed.");

	assert_eq!(found.total_hits, 1);
	assert_eq!(found.results[0].id, "m3");
}

#[tokio::test]
async fn method_full_text_with_level() {
	let service = service_with(seeded_calls());
	let found = service
		.search_methods(MethodSearchQuery {
			query: Some("createUser".to_string()),
			level: Some("ERROR".to_string()),
			page: 0,
			size: 10,
		})
		.await
		.expect("Search failed.");

	assert_eq!(found.total_hits, 1);
	assert_eq!(found.results[0].method.as_deref(), Some("Service.createUser"));
	assert!(found.results[0].result.is_none());
}

#[tokio::test]
async fn date_window_includes_inner_days_and_excludes_later_ones() {
	let backend = seeded_calls();

	backend.seed(METHODS, [call("m4", "2025-01-31T23:59:59", "lateJanuary", "WARN", "START")]);

	let service = service_with(backend);
	let stats = service
		.method_stats(MethodStatsQuery {
			group_by: Some("method".to_string()),
			from: Some("2025-01-01".to_string()),
			to: Some("2025-01-31".to_string()),
		})
		.await
		.expect("Stats failed.");

	assert_eq!(stats.stats.get("getUserById"), Some(&1));
	assert_eq!(stats.stats.get("Service.createUser"), Some(&1));
	assert_eq!(stats.stats.get("lateJanuary"), Some(&1));
	assert!(!stats.stats.contains_key("UserService.updateUser"));
}

#[tokio::test]
async fn method_stats_default_to_level_with_configured_limit() {
	let backend = seeded_calls();
	let service = service_with(backend.clone());
	let stats = service.method_stats(MethodStatsQuery::default()).await.expect("Stats failed.");

	assert_eq!(stats.stats.get("INFO"), Some(&2));
	assert_eq!(stats.stats.get("ERROR"), Some(&1));

	let captured = backend.aggregations();

	assert_eq!(captured.len(), 1);
	assert_eq!(captured[0].index, METHODS);
	assert_eq!(captured[0].field, "level");
	assert_eq!(captured[0].bucket_limit, 10);
	assert!(captured[0].filter.is_empty());
}

#[tokio::test]
async fn unknown_group_by_falls_back() {
	let backend = Arc::new(InMemoryBackend::new());
	let service = service_with(backend.clone());

	service
		.request_stats(RequestStatsQuery { group_by: Some("bogus".to_string()), direction: None })
		.await
		.expect("Stats failed.");
	service
		.method_stats(MethodStatsQuery {
			group_by: Some("bogus".to_string()),
			from: None,
			to: None,
		})
		.await
		.expect("Stats failed.");
	service
		.method_stats(MethodStatsQuery { group_by: Some(" ".to_string()), from: None, to: None })
		.await
		.expect("Stats failed.");

	let fields = backend.aggregations().iter().map(|request| request.field).collect::<Vec<_>>();

	assert_eq!(fields, vec!["statusCode", "method.keyword", "level"]);
}

#[tokio::test]
async fn direction_filter_narrows_traffic_stats() {
	let backend = seeded_traffic();

	backend.seed(REQUESTS, [json!({
		"id": "r4",
		"timestamp": "2025-01-16T08:00:00",
		"uri": "/partner/ping",
		"method": "GET",
		"direction": "OUTGOING",
		"statusCode": "503",
	})]);

	let service = service_with(backend.clone());
	let stats = service
		.request_stats(RequestStatsQuery {
			group_by: Some("uri".to_string()),
			direction: Some("OUTGOING".to_string()),
		})
		.await
		.expect("Stats failed.");

	assert_eq!(stats.stats.len(), 1);
	assert_eq!(stats.stats.get("/partner/ping"), Some(&1));
	assert_eq!(backend.aggregations()[0].bucket_limit, 100);
}

#[tokio::test]
async fn pages_never_exceed_size_and_total_counts_everything() {
	let backend = Arc::new(InMemoryBackend::new());
	let docs = (0..25)
		.map(|i| {
			traffic(&format!("p{i:02}"), &format!("2025-01-10T10:{i:02}:00"), "/api/x", "GET", "200")
		})
		.collect::<Vec<_>>();

	backend.seed(REQUESTS, docs);

	let service = service_with(backend);
	let mut seen = BTreeSet::new();

	for (page, expected) in [(0, 10), (1, 10), (2, 5), (3, 0)] {
		let found = service
			.search_requests(RequestSearchQuery { query: None, status_code: None, page, size: 10 })
			.await
			.expect("Search failed.");

		assert_eq!(found.total_hits, 25);
		assert_eq!(found.results.len(), expected);

		seen.extend(found.results.into_iter().map(|record| record.id));
	}

	assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn stats_sum_never_exceeds_filtered_total() {
	let service = service_with(seeded_traffic());
	let stats = service
		.request_stats(RequestStatsQuery {
			group_by: Some("method".to_string()),
			direction: Some("INCOMING".to_string()),
		})
		.await
		.expect("Stats failed.");
	let total = service.search_requests(search_query(None, None)).await.expect("Search failed.");

	assert!(stats.stats.values().all(|count| *count > 0));
	assert!(stats.stats.values().sum::<u64>() <= total.total_hits);
}

#[tokio::test]
async fn empty_index_yields_empty_envelopes() {
	let service = service_with(Arc::new(InMemoryBackend::new()));
	let found = service.search_requests(search_query(Some("x"), None)).await.expect("Search failed.");
	let stats = service.method_stats(MethodStatsQuery::default()).await.expect("Stats failed.");

	assert!(found.results.is_empty());
	assert_eq!(found.total_hits, 0);
	assert!(stats.stats.is_empty());
}

#[tokio::test]
async fn invalid_enumerations_are_rejected_before_the_backend() {
	let backend = Arc::new(InMemoryBackend::new());
	let service = service_with(backend.clone());
	let err = service
		.request_stats(RequestStatsQuery { group_by: None, direction: Some("incoming".to_string()) })
		.await
		.expect_err("Expected a rejection.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "direction"));

	let err = service
		.find_methods(field_query(None, Some("TRACE")))
		.await
		.expect_err("Expected a rejection.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "logLevel"));

	let err = service
		.search_methods(MethodSearchQuery {
			query: None,
			level: Some("info".to_string()),
			page: 0,
			size: 10,
		})
		.await
		.expect_err("Expected a rejection.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "level"));

	let err = service
		.method_stats(MethodStatsQuery {
			group_by: None,
			from: Some("2025-13-01".to_string()),
			to: None,
		})
		.await
		.expect_err("Expected a rejection.");

	assert!(matches!(err, Error::InvalidRequest { ref field, .. } if field == "from"));
	assert!(backend.searches().is_empty());
	assert!(backend.aggregations().is_empty());
}

#[tokio::test]
async fn backend_failures_keep_their_kind() {
	let backend = seeded_traffic();
	let service = service_with(backend.clone());

	backend.fail_with(Failure::Timeout);

	let err = service.search_requests(search_query(None, None)).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::BackendTimeout { .. }));

	backend.fail_with(Failure::Unavailable);

	let err = service
		.request_stats(RequestStatsQuery::default())
		.await
		.expect_err("Expected failure.");

	assert!(matches!(err, Error::BackendUnavailable { .. }));

	backend.fail_with(Failure::Status(400));

	let err = service.find_methods(field_query(None, None)).await.expect_err("Expected failure.");

	assert!(matches!(err, Error::SearchFailed { .. }));

	backend.recover();

	assert!(service.search_requests(search_query(None, None)).await.is_ok());
}
