// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The public tracking endpoint.
//!
//! Tracking snippets run on third-party sites, so every response is
//! CORS-open and every ingestion failure past input validation is reported
//! as `success: true`.

use axum::{
	body::Bytes,
	http::{header, HeaderMap, HeaderName, Method, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use pulse_analytics_core::AnalyticsPayload;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use super::{dispatch, RequestContext};
use crate::api::{AnalyticsErrorResponse, TrackResponse};
use crate::repository::{AnalyticsRepository, TenantDirectory};
use crate::resolver::TenantResolver;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const UNRESOLVED_TENANT: &str = "unresolved_tenant";

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, X-Tenant-ID, X-Organization-Id, Authorization";

/// Shared state for the tracking endpoint.
pub struct IngestState<R: AnalyticsRepository, D: TenantDirectory> {
	pub repository: R,
	pub resolver: TenantResolver<D>,
}

impl<R: AnalyticsRepository, D: TenantDirectory> IngestState<R, D> {
	pub fn new(repository: R, resolver: TenantResolver<D>) -> Self {
		Self {
			repository,
			resolver,
		}
	}
}

pub fn cors_headers() -> [(HeaderName, &'static str); 3] {
	[
		(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
		(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
		(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
	]
}

fn respond(status: StatusCode, body: impl serde::Serialize) -> Response {
	(status, cors_headers(), Json(body)).into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
}

fn body_value(body: &Value, field: &str) -> Option<String> {
	body
		.get(field)
		.and_then(Value::as_str)
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
}

/// Picks the tenant identifier. Headers take precedence over body fields,
/// and a tenant id over an organization id.
pub fn extract_identifier(headers: &HeaderMap, body: &Value) -> Option<String> {
	let tenant_id = header_value(headers, TENANT_HEADER).or_else(|| body_value(body, "tenantId"));
	let org_id =
		header_value(headers, ORGANIZATION_HEADER).or_else(|| body_value(body, "orgId"));
	tenant_id.or(org_id)
}

#[instrument(skip(state, headers, body), fields(method = %method))]
pub async fn track_impl<R: AnalyticsRepository, D: TenantDirectory>(
	state: Arc<IngestState<R, D>>,
	method: Method,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	if method == Method::OPTIONS {
		return (StatusCode::NO_CONTENT, cors_headers()).into_response();
	}

	if method != Method::POST {
		return respond(
			StatusCode::METHOD_NOT_ALLOWED,
			AnalyticsErrorResponse {
				error: "method_not_allowed".to_string(),
				message: "Only POST and OPTIONS are supported".to_string(),
			},
		);
	}

	let body: Value = match serde_json::from_slice(&body) {
		Ok(value) => value,
		Err(e) => {
			tracing::error!(error = %e, "failed to parse tracking body");
			return respond(
				StatusCode::OK,
				TrackResponse::failed(format!("invalid JSON body: {e}")),
			);
		}
	};

	let Some(identifier) = extract_identifier(&headers, &body) else {
		return respond(
			StatusCode::BAD_REQUEST,
			AnalyticsErrorResponse {
				error: "missing_tenant".to_string(),
				message: "A tenant or organization identifier is required".to_string(),
			},
		);
	};

	let Some(scope) = state.resolver.resolve(&identifier).await else {
		tracing::debug!(identifier = %identifier, "tracking call skipped, tenant unresolved");
		return respond(StatusCode::OK, TrackResponse::skipped(UNRESOLVED_TENANT));
	};

	let payload = match AnalyticsPayload::from_value(body) {
		Ok(payload) => payload,
		Err(e) => {
			tracing::error!(error = %e, org_id = %scope.org_id, "failed to decode tracking payload");
			return respond(StatusCode::OK, TrackResponse::failed(e.to_string()));
		}
	};

	let kind = payload.kind();
	let ctx = RequestContext {
		user_agent: header_value(&headers, header::USER_AGENT.as_str()),
	};

	if let Err(e) = dispatch(&state.repository, &scope, payload, &ctx).await {
		tracing::error!(error = %e, kind, org_id = %scope.org_id, "failed to record analytics payload");
		return respond(StatusCode::OK, TrackResponse::failed(e.to_string()));
	}

	respond(StatusCode::OK, TrackResponse::ok())
}
