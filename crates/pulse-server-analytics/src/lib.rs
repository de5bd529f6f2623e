// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Analytics ingestion server implementation for Pulse.
//!
//! This crate turns a raw tracking request into stored rows: it resolves
//! the tenant, routes the payload by kind and writes it through a
//! repository.
//!
//! # Architecture
//!
//! - `resolver` - Identifier to organization/project resolution
//! - `repository` - Directory lookups and analytics writes (SQLite)
//! - `handlers` - One handler per payload kind, plus the `track` endpoint
//!
//! # Example
//!
//! ```ignore
//! use pulse_server_analytics::{
//! 	IngestState, ResolverConfig, SqliteAnalyticsRepository, TenantResolver,
//! };
//! use pulse_server_db::DirectoryRepository;
//!
//! let resolver = TenantResolver::new(DirectoryRepository::new(pool.clone()), ResolverConfig::default());
//! let state = Arc::new(IngestState::new(SqliteAnalyticsRepository::new(pool), resolver));
//!
//! let response = track_impl(state, Method::POST, headers, body).await;
//! ```

pub mod api;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AnalyticsErrorResponse, TrackResponse};
pub use error::{AnalyticsServerError, Result};
pub use handlers::track::{cors_headers, extract_identifier, track_impl, IngestState};
pub use handlers::{dispatch, RequestContext};
pub use repository::{AnalyticsRepository, SqliteAnalyticsRepository, TenantDirectory};
pub use resolver::{ResolverConfig, TenantResolver};
