// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory records and tenant resolution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OrgId, ProjectId};

/// An organization that owns one or more tracked projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
	pub id: OrgId,
	pub name: String,
	pub slug: Option<String>,
	pub domain: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// A tracked site belonging to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
	pub id: ProjectId,
	pub org_id: OrgId,
	/// Public identifier embedded in the tracking snippet
	pub tracking_code: Option<String>,
	pub domain: Option<String>,
	/// Whether this project may be addressed directly by tracking calls
	pub is_tenant: bool,
	/// Whether this project is the operator's own primary site
	pub is_operator_site: bool,
	pub created_at: DateTime<Utc>,
}

/// Which resolution step produced a [`TenantScope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
	/// Matched a tenant project by tracking code, id or domain
	Project,
	/// Matched one of the operator aliases
	OperatorAlias,
	/// Matched an organization by slug or id
	Organization,
	/// The identifier was a bare UUID taken as the organization id
	RawUuid,
}

impl std::fmt::Display for ResolvedVia {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ResolvedVia::Project => write!(f, "project"),
			ResolvedVia::OperatorAlias => write!(f, "operator_alias"),
			ResolvedVia::Organization => write!(f, "organization"),
			ResolvedVia::RawUuid => write!(f, "raw_uuid"),
		}
	}
}

/// The organization (and optionally project) an ingestion call is attributed to.
///
/// An unresolved identifier is represented as `Option::<TenantScope>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub resolved_via: ResolvedVia,
}

impl TenantScope {
	#[must_use]
	pub fn for_project(project: &ProjectRecord, resolved_via: ResolvedVia) -> Self {
		Self {
			org_id: project.org_id,
			project_id: Some(project.id),
			resolved_via,
		}
	}

	#[must_use]
	pub fn org_only(org_id: OrgId, resolved_via: ResolvedVia) -> Self {
		Self {
			org_id,
			project_id: None,
			resolved_via,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn for_project_carries_both_ids() {
		let project = ProjectRecord {
			id: ProjectId::new(),
			org_id: OrgId::new(),
			tracking_code: Some("trk_1".to_string()),
			domain: None,
			is_tenant: true,
			is_operator_site: false,
			created_at: Utc::now(),
		};
		let scope = TenantScope::for_project(&project, ResolvedVia::Project);
		assert_eq!(scope.org_id, project.org_id);
		assert_eq!(scope.project_id, Some(project.id));
	}

	#[test]
	fn resolved_via_display() {
		assert_eq!(ResolvedVia::OperatorAlias.to_string(), "operator_alias");
		assert_eq!(ResolvedVia::RawUuid.to_string(), "raw_uuid");
	}
}
