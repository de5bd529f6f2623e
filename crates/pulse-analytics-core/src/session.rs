// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Visitor session types.
//!
//! Sessions have no server-side state machine. The tracking snippet sends
//! `start`, any number of `update`s and finally `end`, all keyed by the same
//! client-generated session id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceInfo;
use crate::ids::{OrgId, ProjectId};
use crate::payload::UtmParams;

/// Conversion stamp recorded against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
	pub conversion_type: Option<String>,
	pub value: Option<f64>,
	pub converted_at: DateTime<Utc>,
}

/// A visitor's browsing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	/// Client-generated session identifier
	pub session_id: String,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub visitor_id: Option<String>,

	pub started_at: DateTime<Utc>,
	pub ended_at: Option<DateTime<Utc>>,
	pub last_activity_at: DateTime<Utc>,
	pub duration_seconds: Option<i64>,

	pub page_count: i64,
	pub event_count: i64,

	pub entry_page: Option<String>,
	pub last_page: Option<String>,
	pub exit_page: Option<String>,
	pub referrer: Option<String>,
	pub utm: UtmParams,
	pub device: DeviceInfo,

	pub conversion: Option<Conversion>,
}

impl Session {
	/// Creates a session that starts now.
	pub fn start(session_id: String, org_id: OrgId, project_id: Option<ProjectId>) -> Self {
		let now = Utc::now();
		Self {
			session_id,
			org_id,
			project_id,
			visitor_id: None,
			started_at: now,
			ended_at: None,
			last_activity_at: now,
			duration_seconds: None,
			page_count: 0,
			event_count: 0,
			entry_page: None,
			last_page: None,
			exit_page: None,
			referrer: None,
			utm: UtmParams::default(),
			device: DeviceInfo::default(),
			conversion: None,
		}
	}

	pub fn is_converted(&self) -> bool {
		self.conversion.is_some()
	}

	pub fn is_ended(&self) -> bool {
		self.ended_at.is_some()
	}
}

/// A partial update to an existing session.
///
/// `None` fields leave the stored value untouched. In particular a `None`
/// conversion never clears a previously stamped one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
	pub session_id: String,
	pub org_id: OrgId,
	pub page_count: Option<i64>,
	pub event_count: Option<i64>,
	pub last_page: Option<String>,
	pub duration_seconds: Option<i64>,
	pub conversion: Option<Conversion>,
	/// Set only for the final `end` call
	pub ended_at: Option<DateTime<Utc>>,
	pub updated_at: DateTime<Utc>,
}

impl SessionUpdate {
	pub fn new(session_id: String, org_id: OrgId) -> Self {
		Self {
			session_id,
			org_id,
			page_count: None,
			event_count: None,
			last_page: None,
			duration_seconds: None,
			conversion: None,
			ended_at: None,
			updated_at: Utc::now(),
		}
	}

	pub fn is_end(&self) -> bool {
		self.ended_at.is_some()
	}
}
