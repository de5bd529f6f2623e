// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Pulse site analytics ingestion.
//!
//! This crate has no I/O. It provides:
//!
//! - `ids` - Organization and project identifiers
//! - `tenant` - Directory records and the result of tenant resolution
//! - `payload` - The typed ingestion payload, one variant per event kind
//! - `session`, `telemetry`, `visitor` - Rows written by the ingestion handlers
//! - `device` - User-agent classification
//!
//! # Example
//!
//! ```
//! use pulse_analytics_core::{parse_user_agent, AnalyticsPayload};
//!
//! let payload = AnalyticsPayload::from_value(serde_json::json!({
//! 	"type": "web_vitals",
//! 	"metricName": "lcp",
//! 	"metricValue": 2300,
//! }))
//! .unwrap();
//! assert_eq!(payload.kind(), "web_vitals");
//!
//! let device = parse_user_agent("Mozilla/5.0 (Windows NT 10.0) Chrome/120.0 Safari/537.36 Edg/120.0");
//! assert_eq!(device.browser, "Edge");
//! ```

pub mod device;
pub mod error;
pub mod ids;
pub mod payload;
pub mod session;
pub mod telemetry;
pub mod tenant;
pub mod visitor;

pub use device::{parse_user_agent, DeviceInfo, DeviceType};
pub use error::{AnalyticsError, Result};
pub use ids::{OrgId, ProjectId};
pub use payload::{
	AnalyticsPayload, CustomEventPayload, HeatmapClickPayload, IdentifyPayload, PageViewPayload,
	ScrollDepthPayload, SessionAction, SessionPayload, UtmParams, WebVitalsPayload,
};
pub use session::{Conversion, Session, SessionUpdate};
pub use telemetry::{CustomEvent, HeatmapClick, PageView, ScrollDepth, VitalRating, WebVital};
pub use tenant::{OrganizationRecord, ProjectRecord, ResolvedVia, TenantScope};
pub use visitor::KnownVisitor;
