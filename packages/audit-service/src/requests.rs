use serde::Deserialize;

use audit_domain::{
	envelope::{SearchResponse, StatsResponse},
	query::{Page, SearchRequest},
	routing,
	traffic::{self, Direction, TrafficGroupBy, TrafficRecord},
};

use crate::{AuditService, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSearchQuery {
	pub query: Option<String>,
	pub status_code: Option<String>,
	#[serde(default, deserialize_with = "crate::params::page")]
	pub page: u32,
	#[serde(default = "crate::params::default_size", deserialize_with = "crate::params::size")]
	pub size: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFieldQuery {
	pub uri: Option<String>,
	pub method: Option<String>,
	pub status_code: Option<String>,
	#[serde(default, deserialize_with = "crate::params::page")]
	pub page: u32,
	#[serde(default = "crate::params::default_size", deserialize_with = "crate::params::size")]
	pub size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatsQuery {
	pub group_by: Option<String>,
	pub direction: Option<String>,
}

impl AuditService {
	pub async fn search_requests(
		&self,
		req: RequestSearchQuery,
	) -> Result<SearchResponse<TrafficRecord>> {
		let route = traffic::route_text_search(req.query.as_deref(), req.status_code.as_deref());
		let request = SearchRequest::paged(
			self.cfg.indices.requests.as_str(),
			route.query,
			Page::new(req.page, req.size),
		);

		self.fetch_records(request).await
	}

	pub async fn find_requests(
		&self,
		req: RequestFieldQuery,
	) -> Result<SearchResponse<TrafficRecord>> {
		let route = traffic::route_field_search(
			req.uri.as_deref(),
			req.method.as_deref(),
			req.status_code.as_deref(),
		);
		let request = SearchRequest::paged(
			self.cfg.indices.requests.as_str(),
			route.query,
			Page::new(req.page, req.size),
		);

		self.fetch_records(request).await
	}

	pub async fn request_stats(&self, req: RequestStatsQuery) -> Result<StatsResponse> {
		let direction = routing::non_blank(req.direction.as_deref())
			.map(Direction::from_param)
			.transpose()?;
		let group_by = TrafficGroupBy::from_param(routing::non_blank(req.group_by.as_deref()));
		let request = traffic::stats_request(
			&self.cfg.indices.requests,
			group_by,
			direction,
			self.cfg.stats.request_bucket_limit,
		);

		self.fetch_stats(request).await
	}
}
