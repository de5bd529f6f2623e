// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session lifecycle: `start`, `update` and `end`.

use chrono::Utc;
use pulse_analytics_core::{
	Conversion, Session, SessionAction, SessionPayload, SessionUpdate, TenantScope,
};
use tracing::instrument;

use super::{non_empty, resolve_device, RequestContext};
use crate::error::Result;
use crate::repository::AnalyticsRepository;

#[instrument(skip(repository, payload, ctx), fields(action = %payload.action))]
pub async fn record_session<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	payload: SessionPayload,
	ctx: &RequestContext,
) -> Result<()> {
	let Some(session_id) = non_empty(payload.session_id.clone()) else {
		tracing::debug!("session payload without sessionId ignored");
		return Ok(());
	};

	match payload.action {
		SessionAction::Start => start_session(repository, scope, session_id, payload, ctx).await,
		SessionAction::Update | SessionAction::End => {
			patch_session(repository, scope, session_id, payload).await
		}
	}
}

async fn start_session<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	session_id: String,
	payload: SessionPayload,
	ctx: &RequestContext,
) -> Result<()> {
	let device = resolve_device(
		payload.user_agent.as_deref(),
		ctx,
		payload.device_type.as_deref(),
		payload.browser.as_deref(),
		payload.os.as_deref(),
	);
	let entry_page = non_empty(payload.path).or_else(|| non_empty(payload.last_page.clone()));

	let mut session = Session::start(session_id, scope.org_id, scope.project_id);
	session.visitor_id = non_empty(payload.visitor_id);
	session.last_page = non_empty(payload.last_page).or_else(|| entry_page.clone());
	session.entry_page = entry_page;
	session.referrer = non_empty(payload.referrer);
	session.utm = payload.utm;
	session.device = device;
	session.page_count = payload.page_count.unwrap_or(0);
	session.event_count = payload.event_count.unwrap_or(0);

	if !repository.create_session(&session).await? {
		tracing::debug!(session_id = %session.session_id, "duplicate session start ignored");
	}
	Ok(())
}

async fn patch_session<R: AnalyticsRepository + ?Sized>(
	repository: &R,
	scope: &TenantScope,
	session_id: String,
	payload: SessionPayload,
) -> Result<()> {
	let mut update = SessionUpdate::new(session_id, scope.org_id);
	update.page_count = payload.page_count;
	update.event_count = payload.event_count;
	update.last_page = non_empty(payload.last_page).or_else(|| non_empty(payload.path));
	update.duration_seconds = payload.duration;

	if payload.converted == Some(true) {
		update.conversion = Some(Conversion {
			conversion_type: non_empty(payload.conversion_type),
			value: payload.conversion_value,
			converted_at: update.updated_at,
		});
	}
	if payload.action == SessionAction::End {
		update.ended_at = Some(Utc::now());
	}

	if !repository.update_session(&update).await? {
		tracing::debug!(session_id = %update.session_id, "session update matched no session");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::RecordingRepository;
	use pulse_analytics_core::{OrgId, ResolvedVia};

	fn scope() -> TenantScope {
		TenantScope::org_only(OrgId::new(), ResolvedVia::Organization)
	}

	fn payload(action: SessionAction) -> SessionPayload {
		SessionPayload {
			session_id: Some("sess-1".to_string()),
			action,
			..SessionPayload::default()
		}
	}

	#[tokio::test]
	async fn missing_session_id_is_ignored() {
		let repo = RecordingRepository::default();
		let mut p = payload(SessionAction::Start);
		p.session_id = Some("  ".to_string());

		record_session(&repo, &scope(), p, &RequestContext::default())
			.await
			.unwrap();
		assert_eq!(repo.call_count(), 0);
	}

	#[tokio::test]
	async fn start_records_attribution() {
		let repo = RecordingRepository::default();
		let mut p = payload(SessionAction::Start);
		p.path = Some("/landing".to_string());
		p.referrer = Some("https://search.test".to_string());
		p.utm.utm_campaign = Some("spring".to_string());

		record_session(&repo, &scope(), p, &RequestContext::default())
			.await
			.unwrap();

		let sessions = repo.sessions.lock().unwrap();
		assert_eq!(sessions.len(), 1);
		assert_eq!(sessions[0].entry_page.as_deref(), Some("/landing"));
		assert_eq!(sessions[0].last_page.as_deref(), Some("/landing"));
		assert_eq!(sessions[0].utm.utm_campaign.as_deref(), Some("spring"));
	}

	#[tokio::test]
	async fn duplicate_start_is_not_an_error() {
		let repo = RecordingRepository::default();
		let scope = scope();
		for _ in 0..2 {
			record_session(
				&repo,
				&scope,
				payload(SessionAction::Start),
				&RequestContext::default(),
			)
			.await
			.unwrap();
		}
		assert_eq!(repo.sessions.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn converted_update_stamps_conversion() {
		let repo = RecordingRepository::default();
		let mut p = payload(SessionAction::Update);
		p.converted = Some(true);
		p.conversion_type = Some("signup".to_string());
		p.conversion_value = Some(49.0);

		record_session(&repo, &scope(), p, &RequestContext::default())
			.await
			.unwrap();

		let updates = repo.session_updates.lock().unwrap();
		let conv = updates[0].conversion.as_ref().unwrap();
		assert_eq!(conv.conversion_type.as_deref(), Some("signup"));
		assert_eq!(conv.value, Some(49.0));
		assert!(!updates[0].is_end());
	}

	#[tokio::test]
	async fn update_without_conversion_leaves_it_absent() {
		let repo = RecordingRepository::default();
		let mut p = payload(SessionAction::Update);
		p.converted = Some(false);
		p.conversion_type = Some("signup".to_string());
		p.page_count = Some(4);

		record_session(&repo, &scope(), p, &RequestContext::default())
			.await
			.unwrap();

		let updates = repo.session_updates.lock().unwrap();
		assert!(updates[0].conversion.is_none());
		assert_eq!(updates[0].page_count, Some(4));
	}

	#[tokio::test]
	async fn end_sets_ended_at() {
		let repo = RecordingRepository::default();
		let mut p = payload(SessionAction::End);
		p.last_page = Some("/thanks".to_string());
		p.duration = Some(310);

		record_session(&repo, &scope(), p, &RequestContext::default())
			.await
			.unwrap();

		let updates = repo.session_updates.lock().unwrap();
		assert!(updates[0].is_end());
		assert_eq!(updates[0].last_page.as_deref(), Some("/thanks"));
		assert_eq!(updates[0].duration_seconds, Some(310));
	}
}
