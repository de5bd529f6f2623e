// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User-agent classification.
//!
//! Every table below is evaluated top to bottom and the first matching pattern
//! wins. Many user agents carry several product tokens (a Chromium Edge UA also
//! contains `Chrome/` and `Safari/`, an iPhone UA contains `like Mac OS X`), so
//! the order of the rows is part of the contract.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const UNKNOWN: &str = "unknown";

static TABLET_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)ipad|tablet|playbook|silk|kindle").unwrap());

static MOBILE_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"Mobi|iPhone|iPod|Android|BlackBerry|IEMobile|Opera Mini").unwrap());

static BROWSER_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	[
		(r"Edg(e|A|iOS)?/", "Edge"),
		(r"OPR/|Opera", "Opera"),
		(r"SamsungBrowser/", "Samsung Internet"),
		(r"Chrome/|CriOS/|Chromium/", "Chrome"),
		(r"Firefox/|FxiOS/", "Firefox"),
		(r"Safari/", "Safari"),
		(r"MSIE |Trident/", "Internet Explorer"),
	]
	.into_iter()
	.map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
	.collect()
});

static OS_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	[
		(r"Windows", "Windows"),
		(r"iPhone|iPad|iPod", "iOS"),
		(r"Mac OS X|Macintosh", "macOS"),
		(r"Android", "Android"),
		(r"CrOS", "Chrome OS"),
		(r"Linux", "Linux"),
	]
	.into_iter()
	.map(|(pattern, name)| (Regex::new(pattern).unwrap(), name))
	.collect()
});

/// Coarse device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
	#[default]
	Desktop,
	Mobile,
	Tablet,
}

impl DeviceType {
	pub fn as_str(&self) -> &'static str {
		match self {
			DeviceType::Desktop => "desktop",
			DeviceType::Mobile => "mobile",
			DeviceType::Tablet => "tablet",
		}
	}
}

impl std::fmt::Display for DeviceType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl std::str::FromStr for DeviceType {
	type Err = crate::error::AnalyticsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"desktop" => Ok(DeviceType::Desktop),
			"mobile" => Ok(DeviceType::Mobile),
			"tablet" => Ok(DeviceType::Tablet),
			_ => Err(crate::error::AnalyticsError::InvalidDeviceType(s.to_string())),
		}
	}
}

/// Device, browser and operating system derived from a user agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
	pub device_type: DeviceType,
	pub browser: String,
	pub os: String,
}

impl Default for DeviceInfo {
	fn default() -> Self {
		Self {
			device_type: DeviceType::Desktop,
			browser: UNKNOWN.to_string(),
			os: UNKNOWN.to_string(),
		}
	}
}

impl DeviceInfo {
	/// Replaces parsed values with ones the client reported explicitly.
	///
	/// An unrecognised device type string keeps the parsed device type.
	pub fn with_overrides(
		mut self,
		device_type: Option<&str>,
		browser: Option<&str>,
		os: Option<&str>,
	) -> Self {
		if let Some(parsed) = device_type.and_then(|d| d.parse().ok()) {
			self.device_type = parsed;
		}
		if let Some(browser) = browser.filter(|b| !b.trim().is_empty()) {
			self.browser = browser.to_string();
		}
		if let Some(os) = os.filter(|o| !o.trim().is_empty()) {
			self.os = os.to_string();
		}
		self
	}
}

/// Classifies a user-agent string.
pub fn parse_user_agent(user_agent: &str) -> DeviceInfo {
	DeviceInfo {
		device_type: classify_device(user_agent),
		browser: first_match(&BROWSER_RULES, user_agent).to_string(),
		os: first_match(&OS_RULES, user_agent).to_string(),
	}
}

fn classify_device(user_agent: &str) -> DeviceType {
	if TABLET_REGEX.is_match(user_agent) {
		return DeviceType::Tablet;
	}
	// Android tablets omit the "Mobile" token that Android phones carry.
	if user_agent.contains("Android") && !user_agent.contains("Mobile") {
		return DeviceType::Tablet;
	}
	if MOBILE_REGEX.is_match(user_agent) {
		return DeviceType::Mobile;
	}
	DeviceType::Desktop
}

fn first_match(rules: &[(Regex, &'static str)], user_agent: &str) -> &'static str {
	rules
		.iter()
		.find(|(regex, _)| regex.is_match(user_agent))
		.map(|(_, name)| *name)
		.unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
	const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
	const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
	const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
	const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
	const CHROME_ANDROID_PHONE: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";
	const CHROME_ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
	const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
	const OPERA_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 OPR/105.0.0.0";
	const SAMSUNG_ANDROID: &str = "Mozilla/5.0 (Linux; Android 13; SM-S911B) AppleWebKit/537.36 (KHTML, like Gecko) SamsungBrowser/23.0 Chrome/115.0.0.0 Mobile Safari/537.36";
	const IE11: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; rv:11.0) like Gecko";
	const CHROMEBOOK: &str = "Mozilla/5.0 (X11; CrOS x86_64 14541.0.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

	#[test]
	fn edge_wins_over_chrome() {
		let info = parse_user_agent(EDGE_WINDOWS);
		assert_eq!(info.browser, "Edge");
		assert_eq!(info.os, "Windows");
		assert_eq!(info.device_type, DeviceType::Desktop);
	}

	#[test]
	fn edge_mobile_variants() {
		assert_eq!(parse_user_agent("Mozilla/5.0 (Linux; Android 10) Chrome/120 Mobile Safari/537.36 EdgA/120.0").browser, "Edge");
		assert_eq!(parse_user_agent("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) EdgiOS/120.0 Mobile/15E148 Safari/605.1.15").browser, "Edge");
	}

	#[test]
	fn chrome_desktop() {
		let info = parse_user_agent(CHROME_WINDOWS);
		assert_eq!(info.browser, "Chrome");
		assert_eq!(info.os, "Windows");
	}

	#[test]
	fn iphone_is_ios_not_macos() {
		let info = parse_user_agent(SAFARI_IPHONE);
		assert_eq!(info.device_type, DeviceType::Mobile);
		assert_eq!(info.browser, "Safari");
		assert_eq!(info.os, "iOS");
	}

	#[test]
	fn ipad_is_tablet() {
		let info = parse_user_agent(SAFARI_IPAD);
		assert_eq!(info.device_type, DeviceType::Tablet);
		assert_eq!(info.os, "iOS");
	}

	#[test]
	fn android_phone_and_tablet() {
		let phone = parse_user_agent(CHROME_ANDROID_PHONE);
		assert_eq!(phone.device_type, DeviceType::Mobile);
		assert_eq!(phone.os, "Android");
		assert_eq!(phone.browser, "Chrome");

		let tablet = parse_user_agent(CHROME_ANDROID_TABLET);
		assert_eq!(tablet.device_type, DeviceType::Tablet);
		assert_eq!(tablet.os, "Android");
	}

	#[test]
	fn other_browsers() {
		assert_eq!(parse_user_agent(FIREFOX_LINUX).browser, "Firefox");
		assert_eq!(parse_user_agent(FIREFOX_LINUX).os, "Linux");
		assert_eq!(parse_user_agent(SAFARI_MAC).browser, "Safari");
		assert_eq!(parse_user_agent(SAFARI_MAC).os, "macOS");
		assert_eq!(parse_user_agent(OPERA_WINDOWS).browser, "Opera");
		assert_eq!(parse_user_agent(SAMSUNG_ANDROID).browser, "Samsung Internet");
		assert_eq!(parse_user_agent(IE11).browser, "Internet Explorer");
		assert_eq!(parse_user_agent(CHROMEBOOK).os, "Chrome OS");
	}

	#[test]
	fn empty_user_agent_defaults() {
		assert_eq!(parse_user_agent(""), DeviceInfo::default());
	}

	#[test]
	fn overrides_replace_parsed_values() {
		let info = parse_user_agent(CHROME_WINDOWS).with_overrides(Some("Tablet"), Some("Brave"), None);
		assert_eq!(info.device_type, DeviceType::Tablet);
		assert_eq!(info.browser, "Brave");
		assert_eq!(info.os, "Windows");
	}

	#[test]
	fn unknown_device_override_is_ignored() {
		let info = parse_user_agent(SAFARI_IPHONE).with_overrides(Some("smart-fridge"), Some(" "), None);
		assert_eq!(info.device_type, DeviceType::Mobile);
		assert_eq!(info.browser, "Safari");
	}

	proptest! {
		#[test]
		fn never_panics_and_always_classifies(ua in ".{0,300}") {
			let info = parse_user_agent(&ua);
			prop_assert!(!info.browser.is_empty());
			prop_assert!(!info.os.is_empty());
		}

		#[test]
		fn edg_token_always_means_edge(prefix in "[A-Za-z0-9 ./;()]{0,80}", version in "[0-9.]{1,12}") {
			let ua = format!("{prefix} Chrome/{version} Safari/537.36 Edg/{version}");
			prop_assert_eq!(parse_user_agent(&ua).browser, "Edge");
		}
	}
}
