// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository layer for analytics ingestion.
//!
//! [`TenantDirectory`] is the read side used by tenant resolution.
//! [`AnalyticsRepository`] is the write side used by the per-type handlers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use pulse_analytics_core::{
	Conversion, CustomEvent, DeviceInfo, HeatmapClick, KnownVisitor, OrgId, OrganizationRecord,
	PageView, ProjectId, ProjectRecord, ScrollDepth, Session, SessionUpdate, UtmParams, WebVital,
};
use pulse_server_db::DirectoryRepository;

use crate::error::{AnalyticsServerError, Result};

/// Read-only lookups against organizations and projects.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
	/// A project flagged `is_tenant` whose tracking code, id or domain matches.
	async fn find_tenant_project(&self, identifier: &str) -> Result<Option<ProjectRecord>>;
	/// The project flagged `is_operator_site`, narrowed by domain when given.
	async fn find_operator_project(&self, domain: Option<&str>) -> Result<Option<ProjectRecord>>;
	/// An organization whose slug or id equals `identifier`.
	async fn find_organization(&self, identifier: &str) -> Result<Option<OrganizationRecord>>;
	/// An organization whose slug contains `fragment`.
	async fn find_organization_by_slug_fragment(
		&self,
		fragment: &str,
	) -> Result<Option<OrganizationRecord>>;
}

#[async_trait]
impl TenantDirectory for DirectoryRepository {
	async fn find_tenant_project(&self, identifier: &str) -> Result<Option<ProjectRecord>> {
		Ok(DirectoryRepository::find_tenant_project(self, identifier).await?)
	}

	async fn find_operator_project(&self, domain: Option<&str>) -> Result<Option<ProjectRecord>> {
		Ok(DirectoryRepository::find_operator_project(self, domain).await?)
	}

	async fn find_organization(&self, identifier: &str) -> Result<Option<OrganizationRecord>> {
		Ok(DirectoryRepository::find_organization(self, identifier).await?)
	}

	async fn find_organization_by_slug_fragment(
		&self,
		fragment: &str,
	) -> Result<Option<OrganizationRecord>> {
		Ok(DirectoryRepository::find_organization_by_slug_fragment(self, fragment).await?)
	}
}

/// Repository trait for analytics writes.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
	// Immutable telemetry
	async fn insert_page_view(&self, view: &PageView) -> Result<()>;
	async fn insert_event(&self, event: &CustomEvent) -> Result<()>;
	async fn insert_scroll_depth(&self, scroll: &ScrollDepth) -> Result<()>;
	async fn insert_web_vital(&self, vital: &WebVital) -> Result<()>;
	async fn insert_heatmap_click(&self, click: &HeatmapClick) -> Result<()>;

	// Sessions
	/// Inserts a new session. Returns `false` if the session id already exists.
	async fn create_session(&self, session: &Session) -> Result<bool>;
	/// Applies a partial update. Returns `false` if no session matched.
	async fn update_session(&self, update: &SessionUpdate) -> Result<bool>;
	async fn get_session(&self, org_id: &OrgId, session_id: &str) -> Result<Option<Session>>;

	// Known visitors
	async fn upsert_known_visitor(&self, visitor: &KnownVisitor) -> Result<()>;
	async fn get_known_visitor(
		&self,
		org_id: &OrgId,
		visitor_id: &str,
	) -> Result<Option<KnownVisitor>>;

	// Health
	async fn ping(&self) -> Result<()>;
}

/// SQLite implementation of the analytics repository.
#[derive(Clone)]
pub struct SqliteAnalyticsRepository {
	pool: SqlitePool,
}

impl SqliteAnalyticsRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| AnalyticsServerError::InvalidData(format!("invalid {field}: {e}")))
}

// Database row structs for mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
	session_id: String,
	org_id: String,
	project_id: Option<String>,
	visitor_id: Option<String>,
	started_at: String,
	ended_at: Option<String>,
	last_activity_at: String,
	duration_seconds: Option<i64>,
	page_count: i64,
	event_count: i64,
	entry_page: Option<String>,
	last_page: Option<String>,
	exit_page: Option<String>,
	referrer: Option<String>,
	utm_source: Option<String>,
	utm_medium: Option<String>,
	utm_campaign: Option<String>,
	utm_term: Option<String>,
	utm_content: Option<String>,
	device_type: String,
	browser: String,
	os: String,
	converted: i32,
	conversion_type: Option<String>,
	conversion_value: Option<f64>,
	converted_at: Option<String>,
}

impl TryFrom<SessionRow> for Session {
	type Error = AnalyticsServerError;

	fn try_from(row: SessionRow) -> Result<Self> {
		let conversion = match (row.converted != 0, row.converted_at) {
			(true, Some(at)) => Some(Conversion {
				conversion_type: row.conversion_type,
				value: row.conversion_value,
				converted_at: parse_timestamp("converted_at", &at)?,
			}),
			_ => None,
		};

		Ok(Session {
			session_id: row.session_id,
			org_id: row
				.org_id
				.parse()
				.map_err(|_| AnalyticsServerError::InvalidData("invalid org ID".into()))?,
			project_id: row
				.project_id
				.map(|p| p.parse::<ProjectId>())
				.transpose()
				.map_err(|_| AnalyticsServerError::InvalidData("invalid project ID".into()))?,
			visitor_id: row.visitor_id,
			started_at: parse_timestamp("started_at", &row.started_at)?,
			ended_at: row
				.ended_at
				.map(|s| parse_timestamp("ended_at", &s))
				.transpose()?,
			last_activity_at: parse_timestamp("last_activity_at", &row.last_activity_at)?,
			duration_seconds: row.duration_seconds,
			page_count: row.page_count,
			event_count: row.event_count,
			entry_page: row.entry_page,
			last_page: row.last_page,
			exit_page: row.exit_page,
			referrer: row.referrer,
			utm: UtmParams {
				utm_source: row.utm_source,
				utm_medium: row.utm_medium,
				utm_campaign: row.utm_campaign,
				utm_term: row.utm_term,
				utm_content: row.utm_content,
			},
			device: DeviceInfo {
				device_type: row.device_type.parse()?,
				browser: row.browser,
				os: row.os,
			},
			conversion,
		})
	}
}

#[derive(sqlx::FromRow)]
struct KnownVisitorRow {
	org_id: String,
	project_id: Option<String>,
	visitor_id: String,
	contact_id: Option<String>,
	email: Option<String>,
	name: Option<String>,
	properties: String,
	first_seen_at: String,
	last_seen_at: String,
}

impl TryFrom<KnownVisitorRow> for KnownVisitor {
	type Error = AnalyticsServerError;

	fn try_from(row: KnownVisitorRow) -> Result<Self> {
		Ok(KnownVisitor {
			org_id: row
				.org_id
				.parse()
				.map_err(|_| AnalyticsServerError::InvalidData("invalid org ID".into()))?,
			project_id: row
				.project_id
				.map(|p| p.parse::<ProjectId>())
				.transpose()
				.map_err(|_| AnalyticsServerError::InvalidData("invalid project ID".into()))?,
			visitor_id: row.visitor_id,
			contact_id: row.contact_id,
			email: row.email,
			name: row.name,
			properties: serde_json::from_str(&row.properties)?,
			first_seen_at: parse_timestamp("first_seen_at", &row.first_seen_at)?,
			last_seen_at: parse_timestamp("last_seen_at", &row.last_seen_at)?,
		})
	}
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepository {
	#[instrument(skip(self, view), fields(org_id = %view.org_id, path = %view.path))]
	async fn insert_page_view(&self, view: &PageView) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_page_views (
				id, org_id, project_id, session_id, visitor_id,
				path, title, referrer,
				utm_source, utm_medium, utm_campaign, utm_term, utm_content,
				device_type, browser, os,
				screen_width, screen_height, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(view.id.to_string())
		.bind(view.org_id.to_string())
		.bind(view.project_id.map(|p| p.to_string()))
		.bind(&view.session_id)
		.bind(&view.visitor_id)
		.bind(&view.path)
		.bind(&view.title)
		.bind(&view.referrer)
		.bind(&view.utm.utm_source)
		.bind(&view.utm.utm_medium)
		.bind(&view.utm.utm_campaign)
		.bind(&view.utm.utm_term)
		.bind(&view.utm.utm_content)
		.bind(view.device.device_type.as_str())
		.bind(&view.device.browser)
		.bind(&view.device.os)
		.bind(view.screen_width)
		.bind(view.screen_height)
		.bind(view.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, event), fields(org_id = %event.org_id, event_name = %event.event_name))]
	async fn insert_event(&self, event: &CustomEvent) -> Result<()> {
		let properties = serde_json::to_string(&event.properties)?;

		sqlx::query(
			r#"
			INSERT INTO analytics_events (
				id, org_id, project_id, session_id, visitor_id,
				event_name, event_category, event_label, event_value,
				path, properties, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(event.org_id.to_string())
		.bind(event.project_id.map(|p| p.to_string()))
		.bind(&event.session_id)
		.bind(&event.visitor_id)
		.bind(&event.event_name)
		.bind(&event.event_category)
		.bind(&event.event_label)
		.bind(event.event_value)
		.bind(&event.path)
		.bind(properties)
		.bind(event.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, scroll), fields(org_id = %scroll.org_id, path = %scroll.path))]
	async fn insert_scroll_depth(&self, scroll: &ScrollDepth) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_scroll_depth (
				id, org_id, project_id, session_id, path, max_depth, time_to_depth_ms, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(scroll.id.to_string())
		.bind(scroll.org_id.to_string())
		.bind(scroll.project_id.map(|p| p.to_string()))
		.bind(&scroll.session_id)
		.bind(&scroll.path)
		.bind(scroll.max_depth)
		.bind(scroll.time_to_depth_ms)
		.bind(scroll.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, vital), fields(org_id = %vital.org_id, metric = %vital.metric_name))]
	async fn insert_web_vital(&self, vital: &WebVital) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_web_vitals (
				id, org_id, project_id, session_id, path, metric_name, metric_value, rating, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(vital.id.to_string())
		.bind(vital.org_id.to_string())
		.bind(vital.project_id.map(|p| p.to_string()))
		.bind(&vital.session_id)
		.bind(&vital.path)
		.bind(&vital.metric_name)
		.bind(vital.metric_value)
		.bind(vital.rating.map(|r| r.as_str()))
		.bind(vital.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, click), fields(org_id = %click.org_id, path = %click.path))]
	async fn insert_heatmap_click(&self, click: &HeatmapClick) -> Result<()> {
		sqlx::query(
			r#"
			INSERT INTO analytics_heatmap_clicks (
				id, org_id, project_id, session_id, path, x, y,
				viewport_width, viewport_height, element_selector, element_text, created_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(click.id.to_string())
		.bind(click.org_id.to_string())
		.bind(click.project_id.map(|p| p.to_string()))
		.bind(&click.session_id)
		.bind(&click.path)
		.bind(click.x)
		.bind(click.y)
		.bind(click.viewport_width)
		.bind(click.viewport_height)
		.bind(&click.element_selector)
		.bind(&click.element_text)
		.bind(click.created_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self, session), fields(session_id = %session.session_id, org_id = %session.org_id))]
	async fn create_session(&self, session: &Session) -> Result<bool> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			INSERT INTO analytics_sessions (
				session_id, org_id, project_id, visitor_id,
				started_at, ended_at, last_activity_at, duration_seconds,
				page_count, event_count,
				entry_page, last_page, exit_page, referrer,
				utm_source, utm_medium, utm_campaign, utm_term, utm_content,
				device_type, browser, os,
				converted, conversion_type, conversion_value, converted_at,
				created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(org_id, session_id) DO NOTHING
			"#,
		)
		.bind(&session.session_id)
		.bind(session.org_id.to_string())
		.bind(session.project_id.map(|p| p.to_string()))
		.bind(&session.visitor_id)
		.bind(session.started_at.to_rfc3339())
		.bind(session.ended_at.map(|dt| dt.to_rfc3339()))
		.bind(session.last_activity_at.to_rfc3339())
		.bind(session.duration_seconds)
		.bind(session.page_count)
		.bind(session.event_count)
		.bind(&session.entry_page)
		.bind(&session.last_page)
		.bind(&session.exit_page)
		.bind(&session.referrer)
		.bind(&session.utm.utm_source)
		.bind(&session.utm.utm_medium)
		.bind(&session.utm.utm_campaign)
		.bind(&session.utm.utm_term)
		.bind(&session.utm.utm_content)
		.bind(session.device.device_type.as_str())
		.bind(&session.device.browser)
		.bind(&session.device.os)
		.bind(if session.is_converted() { 1 } else { 0 })
		.bind(
			session
				.conversion
				.as_ref()
				.and_then(|c| c.conversion_type.clone()),
		)
		.bind(session.conversion.as_ref().and_then(|c| c.value))
		.bind(
			session
				.conversion
				.as_ref()
				.map(|c| c.converted_at.to_rfc3339()),
		)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() == 1)
	}

	/// Supplied fields overwrite, absent fields keep their stored value.
	///
	/// A conversion sets the flag, replaces type and value when given, and
	/// stamps `converted_at` only the first time. `exit_page` is set on end
	/// to the last page after this update.
	#[instrument(skip(self, update), fields(session_id = %update.session_id, org_id = %update.org_id))]
	async fn update_session(&self, update: &SessionUpdate) -> Result<bool> {
		let updated_at = update.updated_at.to_rfc3339();
		let ended_at = update.ended_at.map(|dt| dt.to_rfc3339());
		let conversion = update.conversion.as_ref();

		let result = sqlx::query(
			r#"
			UPDATE analytics_sessions SET
				page_count = COALESCE(?, page_count),
				event_count = COALESCE(?, event_count),
				last_page = COALESCE(?, last_page),
				duration_seconds = COALESCE(?, duration_seconds),
				last_activity_at = ?,
				converted = MAX(converted, ?),
				conversion_type = COALESCE(?, conversion_type),
				conversion_value = COALESCE(?, conversion_value),
				converted_at = COALESCE(converted_at, ?),
				ended_at = COALESCE(?, ended_at),
				exit_page = CASE WHEN ? IS NOT NULL THEN COALESCE(?, last_page) ELSE exit_page END,
				updated_at = ?
			WHERE session_id = ? AND org_id = ?
			"#,
		)
		.bind(update.page_count)
		.bind(update.event_count)
		.bind(&update.last_page)
		.bind(update.duration_seconds)
		.bind(&updated_at)
		.bind(if conversion.is_some() { 1 } else { 0 })
		.bind(conversion.and_then(|c| c.conversion_type.clone()))
		.bind(conversion.and_then(|c| c.value))
		.bind(conversion.map(|c| c.converted_at.to_rfc3339()))
		.bind(&ended_at)
		.bind(&ended_at)
		.bind(&update.last_page)
		.bind(&updated_at)
		.bind(&update.session_id)
		.bind(update.org_id.to_string())
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(org_id = %org_id))]
	async fn get_session(&self, org_id: &OrgId, session_id: &str) -> Result<Option<Session>> {
		let row = sqlx::query_as::<_, SessionRow>(
			r#"
			SELECT session_id, org_id, project_id, visitor_id,
				   started_at, ended_at, last_activity_at, duration_seconds,
				   page_count, event_count,
				   entry_page, last_page, exit_page, referrer,
				   utm_source, utm_medium, utm_campaign, utm_term, utm_content,
				   device_type, browser, os,
				   converted, conversion_type, conversion_value, converted_at
			FROM analytics_sessions
			WHERE session_id = ? AND org_id = ?
			"#,
		)
		.bind(session_id)
		.bind(org_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	/// Inserts or merges a known visitor.
	///
	/// Absent contact fields keep their stored values, properties are merged
	/// key by key and `last_seen_at` always advances.
	#[instrument(skip(self, visitor), fields(org_id = %visitor.org_id))]
	async fn upsert_known_visitor(&self, visitor: &KnownVisitor) -> Result<()> {
		let properties = serde_json::to_string(&visitor.properties)?;

		sqlx::query(
			r#"
			INSERT INTO analytics_known_visitors (
				org_id, visitor_id, project_id, contact_id, email, name,
				properties, first_seen_at, last_seen_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			ON CONFLICT(org_id, visitor_id) DO UPDATE SET
				project_id = COALESCE(excluded.project_id, analytics_known_visitors.project_id),
				contact_id = COALESCE(excluded.contact_id, analytics_known_visitors.contact_id),
				email = COALESCE(excluded.email, analytics_known_visitors.email),
				name = COALESCE(excluded.name, analytics_known_visitors.name),
				properties = json_patch(analytics_known_visitors.properties, excluded.properties),
				last_seen_at = excluded.last_seen_at
			"#,
		)
		.bind(visitor.org_id.to_string())
		.bind(&visitor.visitor_id)
		.bind(visitor.project_id.map(|p| p.to_string()))
		.bind(&visitor.contact_id)
		.bind(&visitor.email)
		.bind(&visitor.name)
		.bind(properties)
		.bind(visitor.first_seen_at.to_rfc3339())
		.bind(visitor.last_seen_at.to_rfc3339())
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	#[instrument(skip(self), fields(org_id = %org_id))]
	async fn get_known_visitor(
		&self,
		org_id: &OrgId,
		visitor_id: &str,
	) -> Result<Option<KnownVisitor>> {
		let row = sqlx::query_as::<_, KnownVisitorRow>(
			r#"
			SELECT org_id, project_id, visitor_id, contact_id, email, name,
				   properties, first_seen_at, last_seen_at
			FROM analytics_known_visitors
			WHERE org_id = ? AND visitor_id = ?
			"#,
		)
		.bind(org_id.to_string())
		.bind(visitor_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	async fn ping(&self) -> Result<()> {
		pulse_server_db::check_connection(&self.pool).await?;
		Ok(())
	}
}
