// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed ingestion payloads.
//!
//! Tracking snippets post a flat JSON object whose `type` field selects the
//! event kind. [`AnalyticsPayload::from_value`] turns that object into one
//! variant per kind so handlers never probe for optional properties.
//!
//! Field names on the wire are camelCase. Numeric fields also accept numeric
//! strings, since older snippets stringify everything they read from the DOM.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalyticsError, Result};

pub const DEFAULT_KIND: &str = "page_view";

/// Canonical wire key and the alternate spellings snippets send for it.
type FieldAliases = &'static [(&'static str, &'static [&'static str])];

const UTM_ALIASES: FieldAliases = &[
	("utmSource", &["utm_source"]),
	("utmMedium", &["utm_medium"]),
	("utmCampaign", &["utm_campaign"]),
	("utmTerm", &["utm_term"]),
	("utmContent", &["utm_content"]),
];

const EVENT_ALIASES: FieldAliases = &[
	("eventName", &["name"]),
	("eventCategory", &["category"]),
	("eventLabel", &["label"]),
	("eventValue", &["value"]),
];

const SESSION_ALIASES: FieldAliases = &[
	("path", &["entryPage", "landingPage"]),
	("pageCount", &["pageViews"]),
	("eventCount", &["events"]),
	("lastPage", &["currentPage"]),
	("duration", &["durationSeconds"]),
];

const SCROLL_DEPTH_ALIASES: FieldAliases = &[
	("depth", &["maxDepth", "depthPercentage"]),
	("timeToDepthMs", &["timeToDepth"]),
];

const WEB_VITALS_ALIASES: FieldAliases = &[
	("metricName", &["name", "metric"]),
	("metricValue", &["value"]),
];

const HEATMAP_ALIASES: FieldAliases = &[
	("elementSelector", &["selector"]),
	("elementText", &["text"]),
];

const IDENTIFY_ALIASES: FieldAliases = &[("properties", &["traits"])];

/// Folds alternate spellings onto the canonical key so a body carrying both
/// never fails to decode. A non-null canonical value wins, otherwise the
/// first non-null alias in table order.
fn fold_aliases(map: &mut Map<String, Value>, aliases: FieldAliases) {
	for (canonical, alternates) in aliases {
		let mut chosen = map.remove(*canonical).filter(|v| !v.is_null());
		for alternate in *alternates {
			if let Some(value) = map.remove(*alternate) {
				if chosen.is_none() && !value.is_null() {
					chosen = Some(value);
				}
			}
		}
		if let Some(value) = chosen {
			map.insert((*canonical).to_string(), value);
		}
	}
}

/// Campaign attribution parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmParams {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub utm_source: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub utm_medium: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub utm_campaign: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub utm_term: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub utm_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub url: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub title: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub referrer: Option<String>,
	#[serde(flatten)]
	pub utm: UtmParams,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub user_agent: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub device_type: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub browser: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub os: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub screen_width: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub screen_height: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEventPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub event_name: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub event_category: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub event_label: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub event_value: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default)]
	pub properties: Option<Value>,
}

/// Step in a client-driven session lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
	#[serde(alias = "session_start", alias = "session:start")]
	Start,
	#[default]
	#[serde(alias = "session_update", alias = "session:update", alias = "heartbeat")]
	Update,
	#[serde(alias = "session_end", alias = "session:end")]
	End,
}

impl SessionAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			SessionAction::Start => "start",
			SessionAction::Update => "update",
			SessionAction::End => "end",
		}
	}
}

impl std::fmt::Display for SessionAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for SessionAction {
	type Err = AnalyticsError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"start" => Ok(SessionAction::Start),
			"update" => Ok(SessionAction::Update),
			"end" => Ok(SessionAction::End),
			_ => Err(AnalyticsError::InvalidSessionAction(s.to_string())),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default)]
	pub action: SessionAction,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub referrer: Option<String>,
	#[serde(flatten)]
	pub utm: UtmParams,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub user_agent: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub device_type: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub browser: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub os: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub page_count: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub event_count: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub last_page: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub duration: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_bool")]
	pub converted: Option<bool>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub conversion_type: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub conversion_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollDepthPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub depth: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub time_to_depth_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebVitalsPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub metric_name: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub metric_value: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub rating: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapClickPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub path: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub x: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_f64")]
	pub y: Option<f64>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub viewport_width: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_i64")]
	pub viewport_height: Option<i64>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub element_selector: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub element_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyPayload {
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub visitor_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub session_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub contact_id: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub email: Option<String>,
	#[serde(default, deserialize_with = "lenient::opt_string")]
	pub name: Option<String>,
	#[serde(default)]
	pub properties: Option<Value>,
}

/// An ingestion payload, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsPayload {
	PageView(PageViewPayload),
	Event(CustomEventPayload),
	Session(SessionPayload),
	ScrollDepth(ScrollDepthPayload),
	WebVitals(WebVitalsPayload),
	HeatmapClick(HeatmapClickPayload),
	Identify(IdentifyPayload),
}

impl AnalyticsPayload {
	/// Builds a typed payload from a decoded request body.
	///
	/// A missing or blank `type` means `page_view`. A `type` that names no
	/// known kind becomes a custom event named after the type.
	pub fn from_value(value: Value) -> Result<Self> {
		let Value::Object(mut map) = value else {
			return Err(AnalyticsError::NotAnObject);
		};

		let kind = match map.remove("type") {
			Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
			_ => DEFAULT_KIND.to_string(),
		};
		fold_aliases(&mut map, UTM_ALIASES);
		let kind_aliases: FieldAliases = match kind.as_str() {
			"page_view" | "pageview" => &[],
			"session" => SESSION_ALIASES,
			"scroll_depth" => SCROLL_DEPTH_ALIASES,
			"web_vitals" => WEB_VITALS_ALIASES,
			"heatmap_click" => HEATMAP_ALIASES,
			"identify" => IDENTIFY_ALIASES,
			_ => EVENT_ALIASES,
		};
		fold_aliases(&mut map, kind_aliases);
		let body = Value::Object(map);

		let payload = match kind.as_str() {
			"page_view" | "pageview" => Self::PageView(decode(&kind, body)?),
			"event" => Self::Event(decode(&kind, body)?),
			"session" => Self::Session(decode(&kind, body)?),
			"scroll_depth" => Self::ScrollDepth(decode(&kind, body)?),
			"web_vitals" => Self::WebVitals(decode(&kind, body)?),
			"heatmap_click" => Self::HeatmapClick(decode(&kind, body)?),
			"identify" => Self::Identify(decode(&kind, body)?),
			other => {
				let mut event: CustomEventPayload = decode(other, body)?;
				event.event_name = Some(other.to_string());
				Self::Event(event)
			}
		};

		Ok(payload)
	}

	/// The canonical `type` string for this payload.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::PageView(_) => "page_view",
			Self::Event(_) => "event",
			Self::Session(_) => "session",
			Self::ScrollDepth(_) => "scroll_depth",
			Self::WebVitals(_) => "web_vitals",
			Self::HeatmapClick(_) => "heatmap_click",
			Self::Identify(_) => "identify",
		}
	}
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, body: Value) -> Result<T> {
	serde_json::from_value(body).map_err(|source| AnalyticsError::InvalidPayload {
		kind: kind.to_string(),
		source,
	})
}

mod lenient {
	use serde::{Deserialize, Deserializer};
	use serde_json::Value;

	/// Strings pass through and numbers are stringified; anything else is
	/// treated as absent.
	pub fn opt_string<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<String>, D::Error> {
		Ok(match Option::<Value>::deserialize(deserializer)? {
			Some(Value::String(s)) => Some(s),
			Some(Value::Number(n)) => Some(n.to_string()),
			_ => None,
		})
	}

	/// Non-finite values (`"NaN"`, `"inf"`) are treated as absent.
	pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
		let value = match Option::<Value>::deserialize(deserializer)? {
			Some(Value::Number(n)) => n.as_f64(),
			Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
			_ => None,
		};
		Ok(value.filter(|v| v.is_finite()))
	}

	pub fn opt_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
		Ok(match Option::<Value>::deserialize(deserializer)? {
			Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
			Some(Value::String(s)) => s
				.trim()
				.parse::<f64>()
				.ok()
				.filter(|f| f.is_finite())
				.map(|f| f.round() as i64),
			_ => None,
		})
	}

	pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
		Ok(match Option::<Value>::deserialize(deserializer)? {
			Some(Value::Bool(b)) => Some(b),
			Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
			Some(Value::String(s)) => match s.trim() {
				"true" | "1" => Some(true),
				"false" | "0" => Some(false),
				_ => None,
			},
			_ => None,
		})
	}
}
