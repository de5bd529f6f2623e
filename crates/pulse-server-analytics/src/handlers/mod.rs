// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-type ingestion handlers.
//!
//! Each handler normalizes its own payload and performs its own writes.
//! Handlers never call each other; [`dispatch`] is the only router.

pub mod events;
pub mod identify;
pub mod page_view;
pub mod session;
pub mod telemetry;
pub mod track;

use pulse_analytics_core::{parse_user_agent, AnalyticsPayload, DeviceInfo, TenantScope};
use tracing::instrument;

use crate::error::Result;
use crate::repository::AnalyticsRepository;

/// Request-level values handlers may fall back on.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
	/// The `User-Agent` request header
	pub user_agent: Option<String>,
}

/// Routes a payload to the handler for its kind.
#[instrument(skip(repository, payload, ctx), fields(kind = payload.kind(), org_id = %scope.org_id))]
pub async fn dispatch<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: AnalyticsPayload,
	ctx: &RequestContext,
) -> Result<()> {
	tracing::debug!("dispatching analytics payload");

	match payload {
		AnalyticsPayload::PageView(p) => page_view::record_page_view(repository, scope, p, ctx).await,
		AnalyticsPayload::Event(p) => events::record_event(repository, scope, p).await,
		AnalyticsPayload::Session(p) => session::record_session(repository, scope, p, ctx).await,
		AnalyticsPayload::ScrollDepth(p) => telemetry::record_scroll_depth(repository, scope, p).await,
		AnalyticsPayload::WebVitals(p) => telemetry::record_web_vital(repository, scope, p).await,
		AnalyticsPayload::HeatmapClick(p) => {
			telemetry::record_heatmap_click(repository, scope, p).await
		}
		AnalyticsPayload::Identify(p) => identify::record_identify(repository, scope, p).await,
	}
}

/// Parses the payload's user agent (or the request header) and applies any
/// client-reported overrides.
pub(crate) fn resolve_device(
	payload_user_agent: Option<&str>,
	ctx: &RequestContext,
	device_type: Option<&str>,
	browser: Option<&str>,
	os: Option<&str>,
) -> DeviceInfo {
	payload_user_agent
		.filter(|ua| !ua.trim().is_empty())
		.or(ctx.user_agent.as_deref())
		.map(parse_user_agent)
		.unwrap_or_default()
		.with_overrides(device_type, browser, os)
}

/// Trims and drops empty strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}
