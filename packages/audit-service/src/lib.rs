pub mod methods;
pub mod requests;

mod error;
mod params;
mod shaping;

pub use error::{Error, Result};
pub use methods::{MethodFieldQuery, MethodSearchQuery, MethodStatsQuery};
pub use requests::{RequestFieldQuery, RequestSearchQuery, RequestStatsQuery};

use std::sync::Arc;

use audit_config::Config;
use audit_domain::{
	AuditRecord,
	envelope::{SearchResponse, StatsResponse},
	query::{AggregationRequest, SearchRequest},
};
use audit_search::{ElasticsearchBackend, SearchBackend};

pub struct AuditService {
	pub cfg: Config,
	pub backend: Arc<dyn SearchBackend>,
}
impl AuditService {
	/// Builds the production Elasticsearch gateway from `cfg`.
	pub fn new(cfg: Config) -> Result<Self> {
		let backend = ElasticsearchBackend::new(&cfg.elasticsearch)?;

		Ok(Self::with_backend(cfg, Arc::new(backend)))
	}

	pub fn with_backend(cfg: Config, backend: Arc<dyn SearchBackend>) -> Self {
		Self { cfg, backend }
	}

	async fn fetch_records<T>(&self, request: SearchRequest) -> Result<SearchResponse<T>>
	where
		T: AuditRecord,
	{
		let hits = self.backend.search(&request).await.map_err(|err| {
			tracing::warn!(index = %request.index, error = %err, "Search request failed.");

			Error::from(err)
		})?;

		shaping::records(hits)
	}

	async fn fetch_stats(&self, request: AggregationRequest) -> Result<StatsResponse> {
		let buckets = self.backend.aggregate(&request).await.map_err(|err| {
			tracing::warn!(
				index = %request.index,
				field = request.field,
				error = %err,
				"Aggregation request failed."
			);

			Error::from(err)
		})?;

		Ok(shaping::stats(buckets))
	}
}
