// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use pulse_analytics_core::{IdentifyPayload, KnownVisitor, TenantScope};

use super::non_empty;
use crate::error::Result;
use crate::repository::AnalyticsRepository;

/// Links an anonymous visitor id to a contact.
///
/// Only fields present in the payload are written; the repository merges
/// them into any existing record.
pub async fn record_identify<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: IdentifyPayload,
) -> Result<()> {
	let Some(visitor_id) = non_empty(payload.visitor_id) else {
		tracing::debug!("identify payload without visitorId skipped");
		return Ok(());
	};

	let mut visitor = KnownVisitor::new(scope.org_id, visitor_id);
	visitor.project_id = scope.project_id;
	visitor.contact_id = non_empty(payload.contact_id);
	visitor.email = non_empty(payload.email).map(|e| e.to_lowercase());
	visitor.name = non_empty(payload.name);
	if let Some(properties @ serde_json::Value::Object(_)) = payload.properties {
		visitor.properties = properties;
	}

	repository.upsert_known_visitor(&visitor).await
}
