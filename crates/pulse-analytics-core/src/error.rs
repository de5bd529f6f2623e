// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the analytics core.

use thiserror::Error;

/// Errors that can occur while interpreting analytics payloads.
#[derive(Debug, Error)]
pub enum AnalyticsError {
	/// The payload body was not a JSON object
	#[error("payload must be a JSON object")]
	NotAnObject,

	/// A payload field had the wrong shape
	#[error("invalid {kind} payload: {source}")]
	InvalidPayload {
		kind: String,
		#[source]
		source: serde_json::Error,
	},

	/// Invalid organization or project identifier
	#[error("invalid identifier: {0}")]
	InvalidId(String),

	/// Invalid session action string
	#[error("invalid session action: {0}")]
	InvalidSessionAction(String),

	/// Invalid device type string
	#[error("invalid device type: {0}")]
	InvalidDeviceType(String),
}

/// Result type for analytics core operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
