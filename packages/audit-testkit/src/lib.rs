mod error;
mod memory;

pub use error::{Error, Result};
pub use memory::{Failure, InMemoryBackend};

use std::{env, thread};

use reqwest::{Client, header::CONTENT_TYPE};
use serde_json::{Value, json};
use tokio::runtime::Builder;
use uuid::Uuid;

/// Search-time analyzer installed on every test index.
pub const TEST_ANALYZER: &str = "audit_analyzer";

/// A pair of throwaway indices on a live Elasticsearch node, mapped like the production ones.
pub struct TestIndices {
	client: Client,
	base_url: String,
	requests: String,
	methods: String,
	cleaned: bool,
}
impl TestIndices {
	pub async fn new(base_url: &str) -> Result<Self> {
		let client = Client::new();
		let suffix = Uuid::new_v4().simple().to_string();
		let indices = Self {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
			requests: format!("audit_requests_test_{suffix}"),
			methods: format!("audit_methods_test_{suffix}"),
			cleaned: false,
		};

		indices.create(&indices.requests, requests_mapping()).await?;
		indices.create(&indices.methods, methods_mapping()).await?;

		Ok(indices)
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn requests(&self) -> &str {
		&self.requests
	}

	pub fn methods(&self) -> &str {
		&self.methods
	}

	pub async fn seed_requests(&self, docs: &[Value]) -> Result<()> {
		self.bulk(&self.requests, docs).await
	}

	pub async fn seed_methods(&self, docs: &[Value]) -> Result<()> {
		self.bulk(&self.methods, docs).await
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		delete_indices(&self.client, &self.base_url, &[&self.requests, &self.methods]).await?;

		self.cleaned = true;

		Ok(())
	}

	async fn create(&self, index: &str, mappings: Value) -> Result<()> {
		let body = json!({
			"settings": {
				"analysis": {
					"analyzer": {
						TEST_ANALYZER: {
							"type": "custom",
							"tokenizer": "standard",
							"filter": ["lowercase"]
						}
					}
				}
			},
			"mappings": mappings,
		});
		let res =
			self.client.put(format!("{}/{index}", self.base_url)).json(&body).send().await?;

		if !res.status().is_success() {
			let status = res.status();
			let text = res.text().await.unwrap_or_default();

			return Err(Error::Message(format!("Failed to create index {index}: {status} {text}.")));
		}

		Ok(())
	}

	/// Indexes `docs` and refreshes so they are searchable immediately.
	async fn bulk(&self, index: &str, docs: &[Value]) -> Result<()> {
		let mut payload = String::new();

		for doc in docs {
			let action = match doc.get("id").and_then(Value::as_str) {
				Some(id) => json!({ "index": { "_index": index, "_id": id } }),
				None => json!({ "index": { "_index": index } }),
			};

			payload.push_str(&action.to_string());
			payload.push('\n');
			payload.push_str(&doc.to_string());
			payload.push('\n');
		}

		let res = self
			.client
			.post(format!("{}/_bulk?refresh=true", self.base_url))
			.header(CONTENT_TYPE, "application/x-ndjson")
			.body(payload)
			.send()
			.await?;
		let status = res.status();
		let json: Value = res.json().await?;

		if !status.is_success() || json.get("errors").and_then(Value::as_bool).unwrap_or(true) {
			return Err(Error::Message(format!("Bulk indexing into {index} failed: {json}.")));
		}

		Ok(())
	}
}
impl Drop for TestIndices {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let client = self.client.clone();
		let base_url = self.base_url.clone();
		let names = [self.requests.clone(), self.methods.clone()];
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test index cleanup failed: {err}.");

					return;
				},
			};
			let names = names.iter().map(String::as_str).collect::<Vec<_>>();

			if let Err(err) = runtime.block_on(delete_indices(&client, &base_url, &names)) {
				eprintln!("Test index cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_es_url() -> Option<String> {
	env::var("AUDIT_ES_URL").ok()
}

async fn delete_indices(client: &Client, base_url: &str, names: &[&str]) -> Result<()> {
	for name in names {
		let res = client.delete(format!("{base_url}/{name}")).send().await?;

		// Already gone is fine.
		if !res.status().is_success() && res.status().as_u16() != 404 {
			return Err(Error::Message(format!(
				"Failed to delete test index {name}: {}.",
				res.status()
			)));
		}
	}

	Ok(())
}

fn requests_mapping() -> Value {
	json!({
		"properties": {
			"timestamp": { "type": "date" },
			"uri": {
				"type": "text",
				"fields": { "keyword": { "type": "keyword", "ignore_above": 512 } }
			},
			"method": { "type": "keyword" },
			"direction": { "type": "keyword" },
			"statusCode": { "type": "keyword" },
			"requestBody": { "type": "text" },
			"responseBody": { "type": "text" }
		}
	})
}

fn methods_mapping() -> Value {
	json!({
		"properties": {
			"timestamp": { "type": "date" },
			"method": {
				"type": "text",
				"fields": { "keyword": { "type": "keyword", "ignore_above": 512 } }
			},
			"level": { "type": "keyword" },
			"eventType": { "type": "keyword" },
			"correlationId": { "type": "keyword" },
			"args": { "type": "text" },
			"result": { "type": "text" },
			"errorMessage": { "type": "text" }
		}
	})
}
