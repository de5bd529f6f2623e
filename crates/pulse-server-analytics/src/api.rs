// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the tracking endpoint.

use serde::{Deserialize, Serialize};

/// Body of every non-error response from the tracking endpoint.
///
/// `success` is always `true`: ingestion failures are reported in `error`
/// so that tracking snippets never retry or surface them to visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackResponse {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skipped: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl TrackResponse {
	pub fn ok() -> Self {
		Self {
			success: true,
			skipped: None,
			error: None,
		}
	}

	pub fn skipped(reason: impl Into<String>) -> Self {
		Self {
			skipped: Some(reason.into()),
			..Self::ok()
		}
	}

	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			error: Some(message.into()),
			..Self::ok()
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsErrorResponse {
	pub error: String,
	pub message: String,
}
