use serde::Deserialize;

use audit_domain::{
	calls::{self, CallRecord, DateWindow, EventType, LogLevel, MethodGroupBy},
	envelope::{SearchResponse, StatsResponse},
	query::{Page, SearchRequest},
	routing,
};

use crate::{AuditService, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSearchQuery {
	pub query: Option<String>,
	pub level: Option<String>,
	#[serde(default, deserialize_with = "crate::params::page")]
	pub page: u32,
	#[serde(default = "crate::params::default_size", deserialize_with = "crate::params::size")]
	pub size: u32,
}

/// `logLevel` rather than `level` on this endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFieldQuery {
	pub method: Option<String>,
	pub log_level: Option<String>,
	pub event_type: Option<String>,
	#[serde(default, deserialize_with = "crate::params::page")]
	pub page: u32,
	#[serde(default = "crate::params::default_size", deserialize_with = "crate::params::size")]
	pub size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodStatsQuery {
	pub group_by: Option<String>,
	pub from: Option<String>,
	pub to: Option<String>,
}

impl AuditService {
	pub async fn search_methods(
		&self,
		req: MethodSearchQuery,
	) -> Result<SearchResponse<CallRecord>> {
		let level = parse_level("level", req.level.as_deref())?;
		let route = calls::route_text_search(req.query.as_deref(), level);
		let request = SearchRequest::paged(
			self.cfg.indices.methods.as_str(),
			route.query,
			Page::new(req.page, req.size),
		);

		self.fetch_records(request).await
	}

	pub async fn find_methods(&self, req: MethodFieldQuery) -> Result<SearchResponse<CallRecord>> {
		let level = parse_level("logLevel", req.log_level.as_deref())?;
		let event_type = routing::non_blank(req.event_type.as_deref())
			.map(EventType::from_param)
			.transpose()?;
		let route = calls::route_field_search(req.method.as_deref(), level, event_type);
		let request = SearchRequest::paged(
			self.cfg.indices.methods.as_str(),
			route.query,
			Page::new(req.page, req.size),
		);

		self.fetch_records(request).await
	}

	pub async fn method_stats(&self, req: MethodStatsQuery) -> Result<StatsResponse> {
		let window = DateWindow::parse(req.from.as_deref(), req.to.as_deref())?;
		let group_by = MethodGroupBy::from_param(routing::non_blank(req.group_by.as_deref()));
		let request = calls::stats_request(
			&self.cfg.indices.methods,
			group_by,
			window,
			self.cfg.stats.method_bucket_limit,
		);

		self.fetch_stats(request).await
	}
}

fn parse_level(field: &'static str, value: Option<&str>) -> Result<Option<LogLevel>> {
	Ok(routing::non_blank(value).map(|value| LogLevel::from_param(field, value)).transpose()?)
}
