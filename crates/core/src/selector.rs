//! Element selectors.
//!
//! Selector strings follow the Playwright convention: an explicit `xpath=` or
//! `css=` engine prefix wins; otherwise strings that cannot be CSS (leading
//! `/`, `(` or `..`) are XPath and everything else is CSS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A parsed element selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
	Css(String),
	XPath(String),
}

impl Selector {
	/// Parses a selector string. Never fails; unknown syntax is treated as CSS
	/// and rejected by the page if invalid.
	pub fn parse(input: &str) -> Self {
		let trimmed = input.trim();
		if let Some(rest) = trimmed.strip_prefix("xpath=") {
			return Selector::XPath(rest.trim().to_string());
		}
		if let Some(rest) = trimmed.strip_prefix("css=") {
			return Selector::Css(rest.trim().to_string());
		}
		if trimmed.starts_with('/') || trimmed.starts_with('(') || trimmed.starts_with("..") {
			return Selector::XPath(trimmed.to_string());
		}
		Selector::Css(trimmed.to_string())
	}

	/// Selector expression without the engine prefix.
	pub fn expression(&self) -> &str {
		match self {
			Selector::Css(expr) | Selector::XPath(expr) => expr,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.expression().is_empty()
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Selector::Css(expr) => write!(f, "css={expr}"),
			Selector::XPath(expr) => write!(f, "xpath={expr}"),
		}
	}
}

impl FromStr for Selector {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Selector::parse(s))
	}
}

impl From<&str> for Selector {
	fn from(s: &str) -> Self {
		Selector::parse(s)
	}
}

impl Serialize for Selector {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Selector {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		Ok(Selector::parse(&raw))
	}
}
