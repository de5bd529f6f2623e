// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::Utc;
use pulse_analytics_core::{CustomEvent, CustomEventPayload, TenantScope};
use uuid::Uuid;

use super::non_empty;
use crate::error::Result;
use crate::repository::AnalyticsRepository;

pub const DEFAULT_EVENT_NAME: &str = "custom_event";

pub async fn record_event<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: CustomEventPayload,
) -> Result<()> {
	let properties = match payload.properties {
		Some(serde_json::Value::Null) | None => serde_json::json!({}),
		Some(value) => value,
	};

	let event = CustomEvent {
		id: Uuid::now_v7(),
		org_id: scope.org_id,
		project_id: scope.project_id,
		session_id: non_empty(payload.session_id),
		visitor_id: non_empty(payload.visitor_id),
		event_name: non_empty(payload.event_name).unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
		event_category: non_empty(payload.event_category),
		event_label: non_empty(payload.event_label),
		event_value: payload.event_value,
		path: non_empty(payload.path),
		properties,
		created_at: Utc::now(),
	};

	repository.insert_event(&event).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::RecordingRepository;
	use pulse_analytics_core::{OrgId, ResolvedVia};

	#[tokio::test]
	async fn defaults_name_and_properties() {
		let repo = RecordingRepository::default();
		let scope = TenantScope::org_only(OrgId::new(), ResolvedVia::Organization);

		record_event(&repo, &scope, CustomEventPayload::default())
			.await
			.unwrap();

		let events = repo.events.lock().unwrap();
		assert_eq!(events[0].event_name, DEFAULT_EVENT_NAME);
		assert_eq!(events[0].properties, serde_json::json!({}));
	}

	#[tokio::test]
	async fn keeps_supplied_fields() {
		let repo = RecordingRepository::default();
		let scope = TenantScope::org_only(OrgId::new(), ResolvedVia::Organization);
		let payload = CustomEventPayload {
			event_name: Some("cta_click".to_string()),
			event_category: Some("engagement".to_string()),
			event_value: Some(3.5),
			properties: Some(serde_json::json!({"button": "hero"})),
			..CustomEventPayload::default()
		};

		record_event(&repo, &scope, payload).await.unwrap();

		let events = repo.events.lock().unwrap();
		assert_eq!(events[0].event_name, "cta_click");
		assert_eq!(events[0].event_category.as_deref(), Some("engagement"));
		assert_eq!(events[0].event_value, Some(3.5));
		assert_eq!(events[0].properties["button"], "hero");
	}
}
