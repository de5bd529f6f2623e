// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Immutable per-occurrence telemetry rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::DeviceInfo;
use crate::ids::{OrgId, ProjectId};
use crate::payload::UtmParams;

pub const MAX_ELEMENT_TEXT_CHARS: usize = 100;

/// One page load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
	pub id: Uuid,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub session_id: Option<String>,
	pub visitor_id: Option<String>,
	pub path: String,
	pub title: Option<String>,
	pub referrer: Option<String>,
	pub utm: UtmParams,
	pub device: DeviceInfo,
	pub screen_width: Option<i64>,
	pub screen_height: Option<i64>,
	pub created_at: DateTime<Utc>,
}

/// A custom or business event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
	pub id: Uuid,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub session_id: Option<String>,
	pub visitor_id: Option<String>,
	pub event_name: String,
	pub event_category: Option<String>,
	pub event_label: Option<String>,
	pub event_value: Option<f64>,
	pub path: Option<String>,
	pub properties: serde_json::Value,
	pub created_at: DateTime<Utc>,
}

/// Deepest scroll position reached on a page, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollDepth {
	pub id: Uuid,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub session_id: Option<String>,
	pub path: String,
	pub max_depth: f64,
	pub time_to_depth_ms: Option<i64>,
	pub created_at: DateTime<Utc>,
}

/// A single web vitals measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebVital {
	pub id: Uuid,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub session_id: Option<String>,
	pub path: String,
	/// Always uppercase, e.g. `LCP`
	pub metric_name: String,
	pub metric_value: f64,
	pub rating: Option<VitalRating>,
	pub created_at: DateTime<Utc>,
}

/// A click captured for heatmap rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapClick {
	pub id: Uuid,
	pub org_id: OrgId,
	pub project_id: Option<ProjectId>,
	pub session_id: Option<String>,
	pub path: String,
	pub x: f64,
	pub y: f64,
	pub viewport_width: Option<i64>,
	pub viewport_height: Option<i64>,
	pub element_selector: Option<String>,
	pub element_text: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Core Web Vitals rating bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalRating {
	Good,
	NeedsImprovement,
	Poor,
}

impl VitalRating {
	pub fn as_str(&self) -> &'static str {
		match self {
			VitalRating::Good => "good",
			VitalRating::NeedsImprovement => "needs-improvement",
			VitalRating::Poor => "poor",
		}
	}

	/// Rates a measurement against the published thresholds for its metric.
	///
	/// Returns `None` for metrics without published thresholds.
	pub fn classify(metric_name: &str, value: f64) -> Option<Self> {
		let (good, poor) = match metric_name.to_ascii_uppercase().as_str() {
			"LCP" => (2500.0, 4000.0),
			"FCP" => (1800.0, 3000.0),
			"FID" => (100.0, 300.0),
			"INP" => (200.0, 500.0),
			"TTFB" => (800.0, 1800.0),
			"CLS" => (0.1, 0.25),
			_ => return None,
		};
		Some(if value <= good {
			VitalRating::Good
		} else if value <= poor {
			VitalRating::NeedsImprovement
		} else {
			VitalRating::Poor
		})
	}
}

impl std::fmt::Display for VitalRating {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for VitalRating {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().replace('_', "-").as_str() {
			"good" => Ok(VitalRating::Good),
			"needs-improvement" => Ok(VitalRating::NeedsImprovement),
			"poor" => Ok(VitalRating::Poor),
			_ => Err(format!("invalid vital rating: {s}")),
		}
	}
}

/// Picks the page path from an explicit path or, failing that, a full URL.
///
/// Query strings and fragments are dropped from URLs. Falls back to `/`.
pub fn normalize_path(path: Option<&str>, url: Option<&str>) -> String {
	if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
		return path.to_string();
	}

	let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
		return "/".to_string();
	};

	let after_scheme = match url.find("://") {
		Some(idx) => &url[idx + 3..],
		None => url,
	};
	let path_start = match after_scheme.find('/') {
		Some(idx) => &after_scheme[idx..],
		None => return "/".to_string(),
	};
	let end = path_start.find(['?', '#']).unwrap_or(path_start.len());
	let path = &path_start[..end];
	if path.is_empty() {
		"/".to_string()
	} else {
		path.to_string()
	}
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(value: &str, max: usize) -> String {
	value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_lcp() {
		assert_eq!(VitalRating::classify("lcp", 2300.0), Some(VitalRating::Good));
		assert_eq!(
			VitalRating::classify("LCP", 3000.0),
			Some(VitalRating::NeedsImprovement)
		);
		assert_eq!(VitalRating::classify("LCP", 4500.0), Some(VitalRating::Poor));
	}

	#[test]
	fn classify_cls_uses_unitless_thresholds() {
		assert_eq!(VitalRating::classify("CLS", 0.05), Some(VitalRating::Good));
		assert_eq!(VitalRating::classify("CLS", 0.3), Some(VitalRating::Poor));
	}

	#[test]
	fn classify_unknown_metric() {
		assert_eq!(VitalRating::classify("FPS", 60.0), None);
	}

	#[test]
	fn rating_parse_accepts_client_spellings() {
		assert_eq!(
			"needs_improvement".parse::<VitalRating>(),
			Ok(VitalRating::NeedsImprovement)
		);
		assert_eq!("Good".parse::<VitalRating>(), Ok(VitalRating::Good));
		assert!("meh".parse::<VitalRating>().is_err());
	}

	#[test]
	fn normalize_path_prefers_explicit_path() {
		assert_eq!(
			normalize_path(Some("/blog"), Some("https://x.test/other")),
			"/blog"
		);
	}

	#[test]
	fn normalize_path_from_url() {
		assert_eq!(
			normalize_path(None, Some("https://acme.test/pricing?plan=pro#faq")),
			"/pricing"
		);
		assert_eq!(normalize_path(None, Some("https://acme.test")), "/");
		assert_eq!(normalize_path(Some("  "), None), "/");
	}

	#[test]
	fn truncate_respects_char_boundaries() {
		assert_eq!(truncate_chars("héllo", 2), "hé");
		assert_eq!(truncate_chars("abc", 10), "abc");
	}
}
