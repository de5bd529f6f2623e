// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::Utc;
use pulse_analytics_core::telemetry::normalize_path;
use pulse_analytics_core::{PageView, PageViewPayload, TenantScope};
use uuid::Uuid;

use super::{non_empty, resolve_device, RequestContext};
use crate::error::Result;
use crate::repository::AnalyticsRepository;

pub async fn record_page_view<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: PageViewPayload,
	ctx: &RequestContext,
) -> Result<()> {
	let device = resolve_device(
		payload.user_agent.as_deref(),
		ctx,
		payload.device_type.as_deref(),
		payload.browser.as_deref(),
		payload.os.as_deref(),
	);

	let view = PageView {
		id: Uuid::now_v7(),
		org_id: scope.org_id,
		project_id: scope.project_id,
		session_id: non_empty(payload.session_id),
		visitor_id: non_empty(payload.visitor_id),
		path: normalize_path(payload.path.as_deref(), payload.url.as_deref()),
		title: non_empty(payload.title),
		referrer: non_empty(payload.referrer),
		utm: payload.utm,
		device,
		screen_width: payload.screen_width,
		screen_height: payload.screen_height,
		created_at: Utc::now(),
	};

	repository.insert_page_view(&view).await
}
