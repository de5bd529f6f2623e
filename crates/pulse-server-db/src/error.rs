// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	/// A unique slug or tracking code is already registered.
	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Invalid database URL: {0}")]
	InvalidUrl(String),

	#[error("Migration {name} failed: {source}")]
	Migration {
		name: &'static str,
		#[source]
		source: sqlx::Error,
	},

	/// A stored column could not be decoded (bad UUID or timestamp text).
	#[error("Invalid {field}: {message}")]
	InvalidRow { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, DbError>;
