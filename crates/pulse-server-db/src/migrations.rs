// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embedded schema migrations.
//!
//! Every statement is written with `IF NOT EXISTS`, so the full set is
//! re-applied on each startup.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_directory",
		include_str!("../migrations/001_directory.sql"),
	),
	(
		"002_analytics_sessions",
		include_str!("../migrations/002_analytics_sessions.sql"),
	),
	(
		"003_analytics_telemetry",
		include_str!("../migrations/003_analytics_telemetry.sql"),
	),
	(
		"004_known_visitors",
		include_str!("../migrations/004_known_visitors.sql"),
	),
];

#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for &(name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt)
				.execute(pool)
				.await
				.map_err(|source| DbError::Migration { name, source })?;
		}
		tracing::debug!(migration = %name, "migration applied");
	}

	tracing::info!(count = MIGRATIONS.len(), "database migrations complete");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::Row;

	#[tokio::test]
	async fn migrations_are_idempotent() {
		let pool = crate::testing::create_test_pool().await;
		run_migrations(&pool).await.unwrap();

		let rows = sqlx::query(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'analytics_%' ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap();
		let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

		assert_eq!(
			names,
			vec![
				"analytics_events",
				"analytics_heatmap_clicks",
				"analytics_known_visitors",
				"analytics_page_views",
				"analytics_scroll_depth",
				"analytics_sessions",
				"analytics_web_vitals",
			]
		);
	}

	#[tokio::test]
	async fn failing_statement_names_its_migration() {
		let pool = crate::testing::create_test_pool().await;
		pool.close().await;

		let err = run_migrations(&pool).await.unwrap_err();
		assert!(matches!(
			err,
			DbError::Migration {
				name: "001_directory",
				..
			}
		));
	}
}
