// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixtures shared by this crate's tests and downstream crates.

use chrono::Utc;
use pulse_analytics_core::{OrgId, OrganizationRecord, ProjectId, ProjectRecord};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::directory::DirectoryRepository;
use crate::migrations::run_migrations;

/// An in-memory database with the full schema applied.
///
/// Limited to one connection: every new `:memory:` connection would
/// otherwise open its own empty database.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect(":memory:")
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}

pub async fn seed_organization(
	pool: &SqlitePool,
	name: &str,
	slug: Option<&str>,
) -> OrganizationRecord {
	let org = OrganizationRecord {
		id: OrgId::new(),
		name: name.to_string(),
		slug: slug.map(str::to_string),
		domain: None,
		created_at: Utc::now(),
	};
	DirectoryRepository::new(pool.clone())
		.create_organization(&org)
		.await
		.unwrap();
	org
}

pub async fn seed_project(
	pool: &SqlitePool,
	org_id: &OrgId,
	tracking_code: Option<&str>,
	domain: Option<&str>,
	is_tenant: bool,
	is_operator_site: bool,
) -> ProjectRecord {
	let project = ProjectRecord {
		id: ProjectId::new(),
		org_id: *org_id,
		tracking_code: tracking_code.map(str::to_string),
		domain: domain.map(str::to_string),
		is_tenant,
		is_operator_site,
		created_at: Utc::now(),
	};
	DirectoryRepository::new(pool.clone())
		.create_project(&project)
		.await
		.unwrap();
	project
}
