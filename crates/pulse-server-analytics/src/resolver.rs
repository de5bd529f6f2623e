// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant resolution.
//!
//! Maps the identifier a tracking snippet sends (tracking code, project id,
//! domain, organization slug/id or an operator alias) onto the organization
//! and optional project its rows are written under.
//!
//! Resolution never fails. A lookup error is logged and treated as a miss
//! for that step.

use pulse_analytics_core::{OrgId, ResolvedVia, TenantScope};
use pulse_server_config::TrackingConfig;
use tracing::instrument;
use uuid::Uuid;

use crate::repository::TenantDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
	/// Compared case-insensitively
	pub operator_aliases: Vec<String>,
	/// Domain of the project flagged as the operator site
	pub operator_domain: Option<String>,
	/// Substring of the operator organization's slug
	pub operator_org_slug: Option<String>,
}

impl From<&TrackingConfig> for ResolverConfig {
	fn from(tracking: &TrackingConfig) -> Self {
		Self {
			operator_aliases: tracking.operator_aliases.clone(),
			operator_domain: tracking.operator_domain.clone(),
			operator_org_slug: tracking.operator_org_slug.clone(),
		}
	}
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self::from(&TrackingConfig::default())
	}
}

impl ResolverConfig {
	pub fn is_operator_alias(&self, identifier: &str) -> bool {
		self
			.operator_aliases
			.iter()
			.any(|alias| alias.eq_ignore_ascii_case(identifier))
	}
}

pub struct TenantResolver<D: TenantDirectory> {
	directory: D,
	config: ResolverConfig,
}

impl<D: TenantDirectory> TenantResolver<D> {
	pub fn new(directory: D, config: ResolverConfig) -> Self {
		Self { directory, config }
	}

	pub fn config(&self) -> &ResolverConfig {
		&self.config
	}

	/// Resolves an identifier, first match wins:
	///
	/// 1. a tenant project by tracking code, id or domain
	/// 2. for operator aliases, the operator site project
	/// 3. an organization by slug or id (operator aliases match on the
	///    configured slug fragment instead)
	/// 4. a bare UUID, taken as an organization id
	#[instrument(skip(self))]
	pub async fn resolve(&self, identifier: &str) -> Option<TenantScope> {
		let identifier = identifier.trim();
		if identifier.is_empty() {
			return None;
		}

		if let Some(project) = self
			.lookup("tenant project", self.directory.find_tenant_project(identifier).await)
		{
			return Some(TenantScope::for_project(&project, ResolvedVia::Project));
		}

		let is_alias = self.config.is_operator_alias(identifier);

		if is_alias {
			let domain = self.config.operator_domain.as_deref();
			if let Some(project) = self.lookup(
				"operator project",
				self.directory.find_operator_project(domain).await,
			) {
				return Some(TenantScope::for_project(&project, ResolvedVia::OperatorAlias));
			}
		}

		let org = match (is_alias, self.config.operator_org_slug.as_deref()) {
			(true, Some(fragment)) => self.lookup(
				"operator organization",
				self
					.directory
					.find_organization_by_slug_fragment(fragment)
					.await,
			),
			_ => self.lookup(
				"organization",
				self.directory.find_organization(identifier).await,
			),
		};
		if let Some(org) = org {
			let via = if is_alias {
				ResolvedVia::OperatorAlias
			} else {
				ResolvedVia::Organization
			};
			return Some(TenantScope::org_only(org.id, via));
		}

		if let Ok(uuid) = Uuid::parse_str(identifier) {
			return Some(TenantScope::org_only(OrgId(uuid), ResolvedVia::RawUuid));
		}

		tracing::debug!("identifier did not resolve to a tenant");
		None
	}

	fn lookup<T>(&self, step: &str, result: crate::Result<Option<T>>) -> Option<T> {
		match result {
			Ok(found) => found,
			Err(e) => {
				tracing::warn!(error = %e, step, "tenant lookup failed, treating as miss");
				None
			}
		}
	}
}
