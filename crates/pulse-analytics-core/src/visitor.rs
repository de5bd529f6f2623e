// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Known visitors: anonymous visitor ids linked to an identified contact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrgId, ProjectId};

/// A durable link between an anonymous visitor id and a contact.
///
/// Unique per `(org_id, visitor_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownVisitor {
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub visitor_id: String,
	pub contact_id: Option<String>,
	pub email: Option<String>,
	pub name: Option<String>,
	pub properties: serde_json::Value,
	pub first_seen_at: DateTime<Utc>,
	pub last_seen_at: DateTime<Utc>,
}

impl KnownVisitor {
	pub fn new(org_id: OrgId, visitor_id: String) -> Self {
		let now = Utc::now();
		Self {
			org_id,
			project_id: None,
			visitor_id,
			contact_id: None,
			email: None,
			name: None,
			properties: serde_json::json!({}),
			first_seen_at: now,
			last_seen_at: now,
		}
	}
}
