// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;

use axum::{
	routing::{any, get},
	Router,
};
use pulse_server_analytics::{IngestState, ResolverConfig, SqliteAnalyticsRepository, TenantResolver};
use pulse_server_config::ServerConfig;
use pulse_server_db::DirectoryRepository;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::routes;

pub type AnalyticsIngest = IngestState<SqliteAnalyticsRepository, DirectoryRepository>;

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub ingest: Arc<AnalyticsIngest>,
}

/// Builds the shared state. The pool is expected to be migrated already.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	let resolver = TenantResolver::new(
		DirectoryRepository::new(pool.clone()),
		ResolverConfig::from(&config.tracking),
	);
	let ingest = IngestState::new(SqliteAnalyticsRepository::new(pool.clone()), resolver);

	AppState {
		pool,
		ingest: Arc::new(ingest),
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/analytics/track", any(routes::analytics::track))
		.route("/api/track", any(routes::analytics::track))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
