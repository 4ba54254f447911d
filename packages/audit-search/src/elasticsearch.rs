use std::time::Duration;

use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde_json::Value;

use audit_domain::query::{AggregationRequest, SearchRequest};

use crate::{Bucket, BoxFuture, Error, Result, SearchBackend, SearchHits, dsl};

const MAX_ERROR_BODY: usize = 512;

/// Elasticsearch over its REST `_search` endpoint.
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
	client: Client,
	base_url: String,
	basic_auth: Option<(String, String)>,
	analyzer: Option<String>,
}
impl ElasticsearchBackend {
	pub fn new(cfg: &audit_config::Elasticsearch) -> Result<Self> {
		let mut headers = HeaderMap::new();

		if let Some(api_key) = &cfg.api_key {
			let mut value = HeaderValue::from_str(&format!("ApiKey {api_key}"))?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()
			.map_err(|err| Error::InvalidConfig {
				message: format!("Failed to build Elasticsearch client: {err}."),
			})?;
		let basic_auth = cfg.username.clone().zip(cfg.password.clone());

		Ok(Self {
			client,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			basic_auth,
			analyzer: cfg.full_text_analyzer.clone(),
		})
	}

	async fn post_search(&self, index: &str, body: &Value) -> Result<Value> {
		let url = format!("{}/{}/_search", self.base_url, index);

		tracing::debug!(index, body = %body, "Sending search request.");

		let mut request = self.client.post(url).json(body);

		if let Some((username, password)) = &self.basic_auth {
			request = request.basic_auth(username, Some(password));
		}

		let res = request.send().await?;
		let status = res.status();

		if !status.is_success() {
			let mut body = res.text().await.unwrap_or_default();

			truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);

			return Err(Error::Status { status: status.as_u16(), body });
		}

		Ok(res.json().await?)
	}

	async fn run_search(&self, request: &SearchRequest) -> Result<SearchHits> {
		let body = dsl::search_body(request, self.analyzer.as_deref());
		let json = self.post_search(&request.index, &body).await?;

		dsl::parse_search_response(json)
	}

	async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<Bucket>> {
		let body = dsl::aggregation_body(request);
		let json = self.post_search(&request.index, &body).await?;

		dsl::parse_aggregation_response(json, &request.name())
	}
}

impl SearchBackend for ElasticsearchBackend {
	fn search<'a>(&'a self, request: &'a SearchRequest) -> BoxFuture<'a, Result<SearchHits>> {
		Box::pin(self.run_search(request))
	}

	fn aggregate<'a>(
		&'a self,
		request: &'a AggregationRequest,
	) -> BoxFuture<'a, Result<Vec<Bucket>>> {
		Box::pin(self.run_aggregation(request))
	}
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
	if text.len() <= max {
		return;
	}

	let mut end = max;

	while !text.is_char_boundary(end) {
		end -= 1;
	}

	text.truncate(end);
}
