// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracking endpoint.

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method},
	response::Response,
};
use pulse_server_analytics::track_impl;

use crate::api::AppState;

/// ANY /api/analytics/track - Ingest one tracking call.
///
/// Method handling (OPTIONS preflight, 405 for the rest) lives in
/// `track_impl` so every response carries the CORS headers.
pub async fn track(
	State(state): State<AppState>,
	method: Method,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	track_impl(state.ingest.clone(), method, headers, body).await
}
