// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scroll depth, web vitals and heatmap clicks.
//!
//! Each payload that lacks its measurement is skipped rather than stored
//! with a made-up value.

use chrono::Utc;
use pulse_analytics_core::telemetry::{normalize_path, truncate_chars, MAX_ELEMENT_TEXT_CHARS};
use pulse_analytics_core::{
	HeatmapClick, HeatmapClickPayload, ScrollDepth, ScrollDepthPayload, TenantScope, VitalRating,
	WebVital, WebVitalsPayload,
};
use uuid::Uuid;

use super::non_empty;
use crate::error::Result;
use crate::repository::AnalyticsRepository;

pub async fn record_scroll_depth<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: ScrollDepthPayload,
) -> Result<()> {
	let Some(depth) = payload.depth.filter(|d| d.is_finite()) else {
		tracing::debug!("scroll_depth payload without depth skipped");
		return Ok(());
	};

	let scroll = ScrollDepth {
		id: Uuid::now_v7(),
		org_id: scope.org_id,
		project_id: scope.project_id,
		session_id: non_empty(payload.session_id),
		path: normalize_path(payload.path.as_deref(), None),
		max_depth: depth.clamp(0.0, 100.0),
		time_to_depth_ms: payload.time_to_depth_ms,
		created_at: Utc::now(),
	};

	repository.insert_scroll_depth(&scroll).await
}

pub async fn record_web_vital<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: WebVitalsPayload,
) -> Result<()> {
	let Some(metric_name) = non_empty(payload.metric_name).map(|n| n.to_ascii_uppercase()) else {
		tracing::debug!("web_vitals payload without metric name skipped");
		return Ok(());
	};
	let Some(metric_value) = payload.metric_value.filter(|v| v.is_finite()) else {
		tracing::debug!(metric = %metric_name, "web_vitals payload without value skipped");
		return Ok(());
	};

	let rating = payload
		.rating
		.as_deref()
		.and_then(|r| r.parse::<VitalRating>().ok())
		.or_else(|| VitalRating::classify(&metric_name, metric_value));

	let vital = WebVital {
		id: Uuid::now_v7(),
		org_id: scope.org_id,
		project_id: scope.project_id,
		session_id: non_empty(payload.session_id),
		path: normalize_path(payload.path.as_deref(), None),
		metric_name,
		metric_value,
		rating,
		created_at: Utc::now(),
	};

	repository.insert_web_vital(&vital).await
}

pub async fn record_heatmap_click<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: HeatmapClickPayload,
) -> Result<()> {
	let (Some(x), Some(y)) = (payload.x, payload.y) else {
		tracing::debug!("heatmap_click payload without coordinates skipped");
		return Ok(());
	};

	let click = HeatmapClick {
		id: Uuid::now_v7(),
		org_id: scope.org_id,
		project_id: scope.project_id,
		session_id: non_empty(payload.session_id),
		path: normalize_path(payload.path.as_deref(), None),
		x,
		y,
		viewport_width: payload.viewport_width,
		viewport_height: payload.viewport_height,
		element_selector: non_empty(payload.element_selector),
		element_text: non_empty(payload.element_text)
			.map(|t| truncate_chars(&t, MAX_ELEMENT_TEXT_CHARS)),
		created_at: Utc::now(),
	};

	repository.insert_heatmap_click(&click).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::RecordingRepository;
	use pulse_analytics_core::{AnalyticsPayload, OrgId, ResolvedVia};

	fn scope() -> TenantScope {
		TenantScope::org_only(OrgId::new(), ResolvedVia::Organization)
	}

	#[tokio::test]
	async fn lcp_is_uppercased_and_rated() {
		let repo = RecordingRepository::default();
		let AnalyticsPayload::WebVitals(payload) = AnalyticsPayload::from_value(serde_json::json!({
			"type": "web_vitals",
			"metricName": "lcp",
			"metricValue": 2300,
		}))
		.unwrap() else {
			panic!("expected web vitals payload");
		};

		record_web_vital(&repo, &scope(), payload).await.unwrap();

		let vitals = repo.web_vitals.lock().unwrap();
		assert_eq!(vitals[0].metric_name, "LCP");
		assert_eq!(vitals[0].metric_value, 2300.0);
		assert_eq!(vitals[0].rating, Some(VitalRating::Good));
	}

	#[tokio::test]
	async fn client_rating_is_kept() {
		let repo = RecordingRepository::default();
		let payload = WebVitalsPayload {
			metric_name: Some("CLS".to_string()),
			metric_value: Some(0.01),
			rating: Some("poor".to_string()),
			..WebVitalsPayload::default()
		};

		record_web_vital(&repo, &scope(), payload).await.unwrap();
		assert_eq!(
			repo.web_vitals.lock().unwrap()[0].rating,
			Some(VitalRating::Poor)
		);
	}

	#[tokio::test]
	async fn vital_without_value_is_skipped() {
		let repo = RecordingRepository::default();
		let payload = WebVitalsPayload {
			metric_name: Some("INP".to_string()),
			..WebVitalsPayload::default()
		};

		record_web_vital(&repo, &scope(), payload).await.unwrap();
		assert_eq!(repo.call_count(), 0);
	}

	#[tokio::test]
	async fn scroll_depth_is_clamped() {
		let repo = RecordingRepository::default();
		for depth in [135.0, -4.0] {
			let payload = ScrollDepthPayload {
				depth: Some(depth),
				..ScrollDepthPayload::default()
			};
			record_scroll_depth(&repo, &scope(), payload).await.unwrap();
		}

		let rows = repo.scroll_depths.lock().unwrap();
		assert_eq!(rows[0].max_depth, 100.0);
		assert_eq!(rows[1].max_depth, 0.0);
	}

	#[tokio::test]
	async fn scroll_without_depth_is_skipped() {
		let repo = RecordingRepository::default();
		record_scroll_depth(&repo, &scope(), ScrollDepthPayload::default())
			.await
			.unwrap();
		assert_eq!(repo.call_count(), 0);
	}

	#[tokio::test]
	async fn heatmap_text_is_truncated() {
		let repo = RecordingRepository::default();
		let payload = HeatmapClickPayload {
			x: Some(120.0),
			y: Some(48.5),
			element_text: Some("é".repeat(150)),
			..HeatmapClickPayload::default()
		};

		record_heatmap_click(&repo, &scope(), payload).await.unwrap();

		let clicks = repo.heatmap_clicks.lock().unwrap();
		assert_eq!(
			clicks[0].element_text.as_ref().unwrap().chars().count(),
			MAX_ELEMENT_TEXT_CHARS
		);
	}

	#[tokio::test]
	async fn heatmap_without_coordinates_is_skipped() {
		let repo = RecordingRepository::default();
		let payload = HeatmapClickPayload {
			x: Some(1.0),
			..HeatmapClickPayload::default()
		};
		record_heatmap_click(&repo, &scope(), payload).await.unwrap();
		assert_eq!(repo.call_count(), 0);
	}
}
