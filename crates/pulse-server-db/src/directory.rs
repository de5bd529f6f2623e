// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Organization and project directory.
//!
//! Administrative writes come from the CLI. The lookups are what the
//! tracking endpoint uses to map a caller-supplied identifier onto a tenant.

use chrono::{DateTime, Utc};
use pulse_analytics_core::{OrgId, OrganizationRecord, ProjectId, ProjectRecord};
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use crate::error::DbError;

const PROJECT_COLUMNS: &str =
	"id, org_id, tracking_code, domain, is_tenant, is_operator_site, created_at";

/// Repository for organizations and projects.
///
/// All IDs are UUIDs stored as strings in SQLite.
#[derive(Clone)]
pub struct DirectoryRepository {
	pool: SqlitePool,
}

impl DirectoryRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	// =========================================================================
	// Organizations
	// =========================================================================

	/// Create a new organization.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the slug is already taken.
	#[tracing::instrument(skip(self, org), fields(org_id = %org.id))]
	pub async fn create_organization(&self, org: &OrganizationRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO organizations (id, name, slug, domain, created_at)
			VALUES (?, ?, ?, ?, ?)
			"#,
		)
		.bind(org.id.to_string())
		.bind(&org.name)
		.bind(&org.slug)
		.bind(&org.domain)
		.bind(org.created_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict("Organization slug already exists".to_string())
			}
			_ => DbError::Sqlx(e),
		})?;

		tracing::debug!(org_id = %org.id, slug = ?org.slug, "organization created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %id))]
	pub async fn get_organization(&self, id: &OrgId) -> Result<Option<OrganizationRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, domain, created_at
			FROM organizations
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_organization(&r)).transpose()
	}

	/// Find an organization whose slug or id equals `identifier`.
	#[tracing::instrument(skip(self))]
	pub async fn find_organization(
		&self,
		identifier: &str,
	) -> Result<Option<OrganizationRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, domain, created_at
			FROM organizations
			WHERE slug = ? OR id = ?
			ORDER BY created_at
			LIMIT 1
			"#,
		)
		.bind(identifier)
		.bind(identifier)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_organization(&r)).transpose()
	}

	/// Find the oldest organization whose slug contains `fragment`.
	#[tracing::instrument(skip(self))]
	pub async fn find_organization_by_slug_fragment(
		&self,
		fragment: &str,
	) -> Result<Option<OrganizationRecord>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, slug, domain, created_at
			FROM organizations
			WHERE slug LIKE '%' || ? || '%'
			ORDER BY created_at
			LIMIT 1
			"#,
		)
		.bind(fragment)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_organization(&r)).transpose()
	}

	// =========================================================================
	// Projects
	// =========================================================================

	/// Create a new project.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the tracking code is already taken.
	#[tracing::instrument(skip(self, project), fields(project_id = %project.id, org_id = %project.org_id))]
	pub async fn create_project(&self, project: &ProjectRecord) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO projects (id, org_id, tracking_code, domain, is_tenant, is_operator_site, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(project.id.to_string())
		.bind(project.org_id.to_string())
		.bind(&project.tracking_code)
		.bind(&project.domain)
		.bind(project.is_tenant as i32)
		.bind(project.is_operator_site as i32)
		.bind(project.created_at.to_rfc3339())
		.execute(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict("Project tracking code already exists".to_string())
			}
			_ => DbError::Sqlx(e),
		})?;

		tracing::debug!(project_id = %project.id, "project created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(org_id = %org_id))]
	pub async fn list_projects(&self, org_id: &OrgId) -> Result<Vec<ProjectRecord>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {PROJECT_COLUMNS} FROM projects WHERE org_id = ? ORDER BY created_at"
		))
		.bind(org_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_project).collect()
	}

	/// Find a tenant project whose tracking code, id or domain equals
	/// `identifier`. Domains compare case-insensitively.
	#[tracing::instrument(skip(self))]
	pub async fn find_tenant_project(
		&self,
		identifier: &str,
	) -> Result<Option<ProjectRecord>, DbError> {
		let row = sqlx::query(&format!(
			r#"
			SELECT {PROJECT_COLUMNS}
			FROM projects
			WHERE (tracking_code = ? OR id = ? OR lower(domain) = lower(?))
			  AND is_tenant = 1
			ORDER BY created_at
			LIMIT 1
			"#
		))
		.bind(identifier)
		.bind(identifier)
		.bind(identifier)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_project(&r)).transpose()
	}

	/// Find the operator's own site, optionally narrowed to a domain.
	#[tracing::instrument(skip(self))]
	pub async fn find_operator_project(
		&self,
		domain: Option<&str>,
	) -> Result<Option<ProjectRecord>, DbError> {
		let row = sqlx::query(&format!(
			r#"
			SELECT {PROJECT_COLUMNS}
			FROM projects
			WHERE is_operator_site = 1
			  AND (? IS NULL OR lower(domain) = lower(?))
			ORDER BY created_at
			LIMIT 1
			"#
		))
		.bind(domain)
		.bind(domain)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_project(&r)).transpose()
	}
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|e| invalid_row(field, e))
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
	Uuid::parse_str(value).map_err(|e| invalid_row(field, e))
}

fn invalid_row(field: &str, error: impl std::fmt::Display) -> DbError {
	DbError::InvalidRow {
		field: field.to_string(),
		message: error.to_string(),
	}
}

fn row_to_organization(row: &sqlx::sqlite::SqliteRow) -> Result<OrganizationRecord, DbError> {
	let id: String = row.get("id");
	let created_at: String = row.get("created_at");

	Ok(OrganizationRecord {
		id: OrgId(parse_uuid("org ID", &id)?),
		name: row.get("name"),
		slug: row.get("slug"),
		domain: row.get("domain"),
		created_at: parse_timestamp("created_at", &created_at)?,
	})
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Result<ProjectRecord, DbError> {
	let id: String = row.get("id");
	let org_id: String = row.get("org_id");
	let is_tenant: i32 = row.get("is_tenant");
	let is_operator_site: i32 = row.get("is_operator_site");
	let created_at: String = row.get("created_at");

	Ok(ProjectRecord {
		id: ProjectId(parse_uuid("project ID", &id)?),
		org_id: OrgId(parse_uuid("org ID", &org_id)?),
		tracking_code: row.get("tracking_code"),
		domain: row.get("domain"),
		is_tenant: is_tenant != 0,
		is_operator_site: is_operator_site != 0,
		created_at: parse_timestamp("created_at", &created_at)?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_test_pool, seed_organization, seed_project};

	async fn make_repo() -> DirectoryRepository {
		DirectoryRepository::new(create_test_pool().await)
	}

	#[tokio::test]
	async fn duplicate_slug_is_conflict() {
		let repo = make_repo().await;
		seed_organization(repo.pool(), "Acme", Some("acme")).await;

		let dup = OrganizationRecord {
			id: OrgId::new(),
			name: "Acme Again".to_string(),
			slug: Some("acme".to_string()),
			domain: None,
			created_at: Utc::now(),
		};
		let err = repo.create_organization(&dup).await.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn find_organization_by_slug_or_id() {
		let repo = make_repo().await;
		let org = seed_organization(repo.pool(), "Acme", Some("acme")).await;

		let by_slug = repo.find_organization("acme").await.unwrap().unwrap();
		assert_eq!(by_slug.id, org.id);

		let by_id = repo
			.find_organization(&org.id.to_string())
			.await
			.unwrap()
			.unwrap();
		assert_eq!(by_id.name, "Acme");

		assert!(repo.find_organization("nope").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn slug_fragment_matches_substring() {
		let repo = make_repo().await;
		let org = seed_organization(repo.pool(), "Operator", Some("pulse-operator-hq")).await;

		let found = repo
			.find_organization_by_slug_fragment("operator")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(found.id, org.id);
	}

	#[tokio::test]
	async fn tenant_project_lookup_by_code_id_and_domain() {
		let repo = make_repo().await;
		let org = seed_organization(repo.pool(), "Acme", Some("acme")).await;
		let project = seed_project(
			repo.pool(),
			&org.id,
			Some("trk_acme"),
			Some("Acme.test"),
			true,
			false,
		)
		.await;
		let project_id = project.id.to_string();

		for identifier in ["trk_acme", project_id.as_str(), "acme.TEST"] {
			let found = repo.find_tenant_project(identifier).await.unwrap().unwrap();
			assert_eq!(found.id, project.id, "lookup by {identifier}");
		}
	}

	#[tokio::test]
	async fn non_tenant_project_is_not_addressable() {
		let repo = make_repo().await;
		let org = seed_organization(repo.pool(), "Acme", Some("acme")).await;
		seed_project(repo.pool(), &org.id, Some("trk_internal"), None, false, false).await;

		assert!(repo.find_tenant_project("trk_internal").await.unwrap().is_none());
	}

	#[tokio::test]
	async fn operator_project_filters_by_domain() {
		let repo = make_repo().await;
		let org = seed_organization(repo.pool(), "Operator", Some("operator")).await;
		let site = seed_project(repo.pool(), &org.id, None, Some("pulse.test"), true, true).await;

		let any = repo.find_operator_project(None).await.unwrap().unwrap();
		assert_eq!(any.id, site.id);

		let matched = repo
			.find_operator_project(Some("PULSE.test"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(matched.id, site.id);

		assert!(repo
			.find_operator_project(Some("other.test"))
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn list_projects_scoped_to_org() {
		let repo = make_repo().await;
		let acme = seed_organization(repo.pool(), "Acme", Some("acme")).await;
		let globex = seed_organization(repo.pool(), "Globex", Some("globex")).await;
		seed_project(repo.pool(), &acme.id, Some("a1"), None, true, false).await;
		seed_project(repo.pool(), &acme.id, Some("a2"), None, true, false).await;
		seed_project(repo.pool(), &globex.id, Some("g1"), None, true, false).await;

		let projects = repo.list_projects(&acme.id).await.unwrap();
		assert_eq!(projects.len(), 2);
		assert!(projects.iter().all(|p| p.org_id == acme.id));
	}

	#[test]
	fn undecodable_column_is_an_invalid_row() {
		let err = parse_uuid("org ID", "not-a-uuid").unwrap_err();
		assert!(matches!(err, DbError::InvalidRow { ref field, .. } if field == "org ID"));

		let err = parse_timestamp("created_at", "yesterday").unwrap_err();
		assert!(matches!(err, DbError::InvalidRow { .. }));
	}
}
