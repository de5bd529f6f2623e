// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics server.

use thiserror::Error;

/// Errors that can occur while ingesting analytics.
#[derive(Debug, Error)]
pub enum AnalyticsServerError {
	/// Database error
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	/// Directory lookup error
	#[error("directory error: {0}")]
	Directory(#[from] pulse_server_db::DbError),

	/// JSON serialization error
	#[error("json error: {0}")]
	Json(#[from] serde_json::Error),

	/// Stored row could not be mapped back into a domain type
	#[error("invalid analytics data: {0}")]
	InvalidData(String),

	/// Core error
	#[error("analytics core error: {0}")]
	Core(#[from] pulse_analytics_core::AnalyticsError),
}

/// Result type for analytics server operations.
pub type Result<T> = std::result::Result<T, AnalyticsServerError>;
