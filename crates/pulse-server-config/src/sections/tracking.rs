// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tenant resolution settings for the tracking endpoint.

use serde::Deserialize;

pub const DEFAULT_OPERATOR_ALIASES: &[&str] = &["main", "operator", "default"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
	/// Identifiers that address the operator's own site
	pub operator_aliases: Vec<String>,
	pub operator_domain: Option<String>,
	/// Matched as a substring of the operator organization's slug
	pub operator_org_slug: Option<String>,
}

impl Default for TrackingConfig {
	fn default() -> Self {
		TrackingConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingConfigLayer {
	#[serde(default)]
	pub operator_aliases: Option<Vec<String>>,
	#[serde(default)]
	pub operator_domain: Option<String>,
	#[serde(default)]
	pub operator_org_slug: Option<String>,
}

impl TrackingConfigLayer {
	pub fn merge(&mut self, other: TrackingConfigLayer) {
		if other.operator_aliases.is_some() {
			self.operator_aliases = other.operator_aliases;
		}
		if other.operator_domain.is_some() {
			self.operator_domain = other.operator_domain;
		}
		if other.operator_org_slug.is_some() {
			self.operator_org_slug = other.operator_org_slug;
		}
	}

	/// Aliases are trimmed but not filtered; empty ones are rejected by
	/// validation.
	pub fn finalize(self) -> TrackingConfig {
		TrackingConfig {
			operator_aliases: self
				.operator_aliases
				.map(|aliases| aliases.iter().map(|a| a.trim().to_string()).collect())
				.unwrap_or_else(|| {
					DEFAULT_OPERATOR_ALIASES
						.iter()
						.map(|a| a.to_string())
						.collect()
				}),
			operator_domain: self.operator_domain,
			operator_org_slug: self.operator_org_slug,
		}
	}
}

/// Splits a comma-separated alias list.
pub(crate) fn parse_alias_list(value: &str) -> Vec<String> {
	value.split(',').map(|a| a.trim().to_string()).collect()
}
