use axum::{
	Json, Router,
	extract::{Query, State, rejection::QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde::Serialize;

use audit_domain::{
	calls::CallRecord,
	envelope::{SearchResponse, StatsResponse},
	traffic::TrafficRecord,
};
use audit_service::{
	Error as ServiceError, MethodFieldQuery, MethodSearchQuery, MethodStatsQuery,
	RequestFieldQuery, RequestSearchQuery, RequestStatsQuery,
};

use crate::state::AppState;

const QUERY_REJECTION_PREFIX: &str = "Failed to deserialize query string: ";

type Params<T> = Result<Query<T>, QueryRejection>;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/v1/requests", get(find_requests))
		.route("/api/v1/requests/search", get(search_requests))
		.route("/api/v1/requests/stats", get(request_stats))
		.route("/api/v1/methods", get(find_methods))
		.route("/api/v1/methods/search", get(search_methods))
		.route("/api/v1/methods/stats", get(method_stats))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_requests(
	State(state): State<AppState>,
	params: Params<RequestSearchQuery>,
) -> Result<Json<SearchResponse<TrafficRecord>>, ApiError> {
	let Query(req) = params?;
	let response = state.service.search_requests(req).await?;

	Ok(Json(response))
}

async fn find_requests(
	State(state): State<AppState>,
	params: Params<RequestFieldQuery>,
) -> Result<Json<SearchResponse<TrafficRecord>>, ApiError> {
	let Query(req) = params?;
	let response = state.service.find_requests(req).await?;

	Ok(Json(response))
}

async fn request_stats(
	State(state): State<AppState>,
	params: Params<RequestStatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
	let Query(req) = params?;
	let response = state.service.request_stats(req).await?;

	Ok(Json(response))
}

async fn search_methods(
	State(state): State<AppState>,
	params: Params<MethodSearchQuery>,
) -> Result<Json<SearchResponse<CallRecord>>, ApiError> {
	let Query(req) = params?;
	let response = state.service.search_methods(req).await?;

	Ok(Json(response))
}

async fn find_methods(
	State(state): State<AppState>,
	params: Params<MethodFieldQuery>,
) -> Result<Json<SearchResponse<CallRecord>>, ApiError> {
	let Query(req) = params?;
	let response = state.service.find_methods(req).await?;

	Ok(Json(response))
}

async fn method_stats(
	State(state): State<AppState>,
	params: Params<MethodStatsQuery>,
) -> Result<Json<StatsResponse>, ApiError> {
	let Query(req) = params?;
	let response = state.service.method_stats(req).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { field, message } => ApiError::new(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				message,
				Some(vec![field]),
			),
			ServiceError::BackendTimeout { .. } => ApiError::new(
				StatusCode::GATEWAY_TIMEOUT,
				"backend_timeout",
				"Search backend timed out.",
				None,
			),
			ServiceError::BackendUnavailable { .. } => ApiError::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"backend_unavailable",
				"Search backend is unavailable.",
				None,
			),
			ServiceError::SearchFailed { .. } => ApiError::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"search_failed",
				"Search request failed.",
				None,
			),
		}
	}
}

impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		let message = rejection.body_text();
		let fields = rejected_field(&message).map(|field| vec![field]);

		ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message, fields)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody {
			error_code: self.error_code,
			message: self.message,
			fields: self.fields,
		};

		(self.status, Json(body)).into_response()
	}
}

/// Parameter name from a query-string rejection such as
/// `Failed to deserialize query string: page: invalid digit found in string`.
fn rejected_field(message: &str) -> Option<String> {
	let detail = message.strip_prefix(QUERY_REJECTION_PREFIX)?;
	let (field, _) = detail.split_once(": ")?;

	(!field.is_empty() && field.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
		.then(|| field.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_parameter_from_rejection_text() {
		assert_eq!(
			rejected_field(
				"Failed to deserialize query string: page: invalid digit found in string"
			),
			Some("page".to_string())
		);
		assert_eq!(rejected_field("Failed to deserialize query string: expected `,`"), None);
		assert_eq!(rejected_field("unrelated: text"), None);
	}
}
