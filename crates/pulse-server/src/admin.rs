// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory administration behind the `org` and `project` subcommands.

use chrono::Utc;
use pulse_analytics_core::{OrgId, OrganizationRecord, ProjectId, ProjectRecord};
use pulse_server_db::{DbError, DirectoryRepository};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
	#[error("database error: {0}")]
	Db(#[from] DbError),

	#[error("organization not found: {0}")]
	OrganizationNotFound(String),

	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

pub struct NewProject {
	pub tracking_code: Option<String>,
	pub domain: Option<String>,
	pub is_tenant: bool,
	pub is_operator_site: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

#[instrument(skip(directory))]
pub async fn create_organization(
	directory: &DirectoryRepository,
	name: &str,
	slug: &str,
	domain: Option<String>,
) -> Result<OrganizationRecord, AdminError> {
	let slug = slug.trim();
	if name.trim().is_empty() || slug.is_empty() {
		return Err(AdminError::InvalidArgument(
			"organization name and slug must not be empty".to_string(),
		));
	}

	let org = OrganizationRecord {
		id: OrgId::new(),
		name: name.trim().to_string(),
		slug: Some(slug.to_string()),
		domain: non_blank(domain),
		created_at: Utc::now(),
	};
	directory.create_organization(&org).await?;

	tracing::info!(org_id = %org.id, slug = %slug, "organization created");
	Ok(org)
}

/// Accepts an organization id or slug.
async fn require_organization(
	directory: &DirectoryRepository,
	org: &str,
) -> Result<OrganizationRecord, AdminError> {
	directory
		.find_organization(org.trim())
		.await?
		.ok_or_else(|| AdminError::OrganizationNotFound(org.to_string()))
}

#[instrument(skip(directory, project))]
pub async fn create_project(
	directory: &DirectoryRepository,
	org: &str,
	project: NewProject,
) -> Result<ProjectRecord, AdminError> {
	let org = require_organization(directory, org).await?;

	let record = ProjectRecord {
		id: ProjectId::new(),
		org_id: org.id,
		tracking_code: non_blank(project.tracking_code),
		domain: non_blank(project.domain).map(|d| d.to_ascii_lowercase()),
		is_tenant: project.is_tenant,
		is_operator_site: project.is_operator_site,
		created_at: Utc::now(),
	};
	directory.create_project(&record).await?;

	tracing::info!(project_id = %record.id, org_id = %org.id, "project created");
	Ok(record)
}

pub async fn list_projects(
	directory: &DirectoryRepository,
	org: &str,
) -> Result<Vec<ProjectRecord>, AdminError> {
	let org = require_organization(directory, org).await?;
	Ok(directory.list_projects(&org.id).await?)
}

/// One line per project, tab separated.
pub fn format_project(project: &ProjectRecord) -> String {
	let mut flags = Vec::new();
	if project.is_tenant {
		flags.push("tenant");
	}
	if project.is_operator_site {
		flags.push("operator");
	}
	format!(
		"{}\t{}\t{}\t{}",
		project.id,
		project.tracking_code.as_deref().unwrap_or("-"),
		project.domain.as_deref().unwrap_or("-"),
		if flags.is_empty() {
			"-".to_string()
		} else {
			flags.join(",")
		},
	)
}
