// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory doubles for the repository traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pulse_analytics_core::{
	CustomEvent, HeatmapClick, KnownVisitor, OrgId, OrganizationRecord, PageView, ProjectId,
	ProjectRecord, ScrollDepth, Session, SessionUpdate, WebVital,
};

use crate::error::{AnalyticsServerError, Result};
use crate::repository::{AnalyticsRepository, TenantDirectory};

fn unavailable() -> AnalyticsServerError {
	AnalyticsServerError::InvalidData("store unavailable".to_string())
}

#[derive(Default)]
pub struct StaticDirectory {
	pub projects: Vec<ProjectRecord>,
	pub organizations: Vec<OrganizationRecord>,
	pub fail: bool,
}

impl StaticDirectory {
	pub fn add_organization(&mut self, slug: &str) -> OrganizationRecord {
		let org = OrganizationRecord {
			id: OrgId::new(),
			name: slug.to_string(),
			slug: Some(slug.to_string()),
			domain: None,
			created_at: Utc::now(),
		};
		self.organizations.push(org.clone());
		org
	}

	pub fn add_project(
		&mut self,
		tracking_code: Option<&str>,
		domain: Option<&str>,
		is_tenant: bool,
		is_operator_site: bool,
	) -> ProjectRecord {
		let project = ProjectRecord {
			id: ProjectId::new(),
			org_id: OrgId::new(),
			tracking_code: tracking_code.map(str::to_string),
			domain: domain.map(str::to_string),
			is_tenant,
			is_operator_site,
			created_at: Utc::now(),
		};
		self.projects.push(project.clone());
		project
	}
}

#[async_trait]
impl TenantDirectory for StaticDirectory {
	async fn find_tenant_project(&self, identifier: &str) -> Result<Option<ProjectRecord>> {
		if self.fail {
			return Err(unavailable());
		}
		Ok(self
			.projects
			.iter()
			.find(|p| {
				p.is_tenant
					&& (p.tracking_code.as_deref() == Some(identifier)
						|| p.id.to_string() == identifier
						|| p
							.domain
							.as_deref()
							.is_some_and(|d| d.eq_ignore_ascii_case(identifier)))
			})
			.cloned())
	}

	async fn find_operator_project(&self, domain: Option<&str>) -> Result<Option<ProjectRecord>> {
		if self.fail {
			return Err(unavailable());
		}
		Ok(self
			.projects
			.iter()
			.find(|p| {
				p.is_operator_site
					&& domain.map_or(true, |want| {
						p.domain
							.as_deref()
							.is_some_and(|d| d.eq_ignore_ascii_case(want))
					})
			})
			.cloned())
	}

	async fn find_organization(&self, identifier: &str) -> Result<Option<OrganizationRecord>> {
		if self.fail {
			return Err(unavailable());
		}
		Ok(self
			.organizations
			.iter()
			.find(|o| o.slug.as_deref() == Some(identifier) || o.id.to_string() == identifier)
			.cloned())
	}

	async fn find_organization_by_slug_fragment(
		&self,
		fragment: &str,
	) -> Result<Option<OrganizationRecord>> {
		if self.fail {
			return Err(unavailable());
		}
		Ok(self
			.organizations
			.iter()
			.find(|o| o.slug.as_deref().is_some_and(|s| s.contains(fragment)))
			.cloned())
	}
}

/// Records every write. With `fail` set, every call errors after being
/// counted.
#[derive(Default)]
pub struct RecordingRepository {
	pub fail: bool,
	pub calls: AtomicUsize,
	pub page_views: Mutex<Vec<PageView>>,
	pub events: Mutex<Vec<CustomEvent>>,
	pub sessions: Mutex<Vec<Session>>,
	pub session_updates: Mutex<Vec<SessionUpdate>>,
	pub scroll_depths: Mutex<Vec<ScrollDepth>>,
	pub web_vitals: Mutex<Vec<WebVital>>,
	pub heatmap_clicks: Mutex<Vec<HeatmapClick>>,
	pub visitors: Mutex<Vec<KnownVisitor>>,
}

impl RecordingRepository {
	pub fn failing() -> Self {
		Self {
			fail: true,
			..Self::default()
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn enter(&self) -> Result<()> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			Err(unavailable())
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl AnalyticsRepository for RecordingRepository {
	async fn insert_page_view(&self, view: &PageView) -> Result<()> {
		self.enter()?;
		self.page_views.lock().unwrap().push(view.clone());
		Ok(())
	}

	async fn insert_event(&self, event: &CustomEvent) -> Result<()> {
		self.enter()?;
		self.events.lock().unwrap().push(event.clone());
		Ok(())
	}

	async fn insert_scroll_depth(&self, scroll: &ScrollDepth) -> Result<()> {
		self.enter()?;
		self.scroll_depths.lock().unwrap().push(scroll.clone());
		Ok(())
	}

	async fn insert_web_vital(&self, vital: &WebVital) -> Result<()> {
		self.enter()?;
		self.web_vitals.lock().unwrap().push(vital.clone());
		Ok(())
	}

	async fn insert_heatmap_click(&self, click: &HeatmapClick) -> Result<()> {
		self.enter()?;
		self.heatmap_clicks.lock().unwrap().push(click.clone());
		Ok(())
	}

	async fn create_session(&self, session: &Session) -> Result<bool> {
		self.enter()?;
		let mut sessions = self.sessions.lock().unwrap();
		if sessions
			.iter()
			.any(|s| s.session_id == session.session_id && s.org_id == session.org_id)
		{
			return Ok(false);
		}
		sessions.push(session.clone());
		Ok(true)
	}

	async fn update_session(&self, update: &SessionUpdate) -> Result<bool> {
		self.enter()?;
		let known = self
			.sessions
			.lock()
			.unwrap()
			.iter()
			.any(|s| s.session_id == update.session_id && s.org_id == update.org_id);
		self.session_updates.lock().unwrap().push(update.clone());
		Ok(known)
	}

	async fn get_session(&self, org_id: &OrgId, session_id: &str) -> Result<Option<Session>> {
		self.enter()?;
		Ok(self
			.sessions
			.lock()
			.unwrap()
			.iter()
			.find(|s| s.session_id == session_id && &s.org_id == org_id)
			.cloned())
	}

	async fn upsert_known_visitor(&self, visitor: &KnownVisitor) -> Result<()> {
		self.enter()?;
		self.visitors.lock().unwrap().push(visitor.clone());
		Ok(())
	}

	async fn get_known_visitor(
		&self,
		org_id: &OrgId,
		visitor_id: &str,
	) -> Result<Option<KnownVisitor>> {
		self.enter()?;
		Ok(self
			.visitors
			.lock()
			.unwrap()
			.iter()
			.rev()
			.find(|v| v.visitor_id == visitor_id && &v.org_id == org_id)
			.cloned())
	}

	async fn ping(&self) -> Result<()> {
		self.enter()
	}
}
