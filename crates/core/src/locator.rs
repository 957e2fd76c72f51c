//! Strategies for finding the controls the query workflow drives.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{ControlHandle, Document};
use crate::error::{Error, Result};
use crate::selector::Selector;

/// Which control a locator is looking for; used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
	Mode,
	Input,
	Submit,
}

impl fmt::Display for ControlKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ControlKind::Mode => "mode control",
			ControlKind::Input => "input field",
			ControlKind::Submit => "submit control",
		})
	}
}

/// ARIA roles understood by [`ControlLocator::Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
	Button,
	Textbox,
	Link,
}

impl AriaRole {
	/// Elements that carry this role explicitly or implicitly.
	fn candidates(self) -> Selector {
		Selector::Css(
			match self {
				AriaRole::Button => "button, [role='button'], input[type='button'], input[type='submit'], input[type='reset']",
				AriaRole::Textbox => {
					"input:not([type]), input[type='text'], input[type='search'], input[type='email'], textarea, [contenteditable='true'], [role='textbox']"
				}
				AriaRole::Link => "a[href], [role='link']",
			}
			.to_string(),
		)
	}

	fn as_str(self) -> &'static str {
		match self {
			AriaRole::Button => "button",
			AriaRole::Textbox => "textbox",
			AriaRole::Link => "link",
		}
	}
}

fn default_boundary_candidates() -> Selector {
	Selector::Css("button".to_string())
}

/// How to find one control on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum ControlLocator {
	/// The first candidate strictly between the candidates whose text holds
	/// `left` and `right`.
	#[serde(rename_all = "camelCase")]
	TextBoundary {
		#[serde(default = "default_boundary_candidates")]
		candidates: Selector,
		left: String,
		right: String,
	},
	/// The `nth` match of `selector`.
	Selector {
		selector: Selector,
		#[serde(default)]
		nth: usize,
	},
	/// The first element with `role` whose text or label contains `name`.
	Role {
		role: AriaRole,
		#[serde(default)]
		name: Option<String>,
	},
}

impl ControlLocator {
	pub fn selector(selector: impl Into<Selector>) -> Self {
		ControlLocator::Selector {
			selector: selector.into(),
			nth: 0,
		}
	}

	pub fn text_boundary(candidates: impl Into<Selector>, left: impl Into<String>, right: impl Into<String>) -> Self {
		ControlLocator::TextBoundary {
			candidates: candidates.into(),
			left: left.into(),
			right: right.into(),
		}
	}

	pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
		ControlLocator::Role {
			role,
			name: Some(name.into()),
		}
	}

	/// Resolves the locator against `document`.
	///
	/// Fails with [`Error::ControlNotFound`] tagged with `kind` when nothing
	/// qualifies; page errors propagate unchanged.
	pub async fn locate(&self, document: &dyn Document, kind: ControlKind) -> Result<ControlHandle> {
		let not_found = |reason: String| Error::ControlNotFound { control: kind, reason };

		match self {
			ControlLocator::Selector { selector, nth } => {
				let mut matches = document.query_all(selector).await?;
				let count = matches.len();
				if *nth >= count {
					return Err(not_found(format!("{selector} matched {count} element(s), wanted index {nth}")));
				}
				debug!(target = "chatpoll", %kind, %selector, count, nth, "located by selector");
				Ok(matches.swap_remove(*nth))
			}
			ControlLocator::TextBoundary { candidates, left, right } => {
				let mut controls = document.query_all(candidates).await?;
				let mut texts = Vec::with_capacity(controls.len());
				for control in &controls {
					texts.push(control.text_content().await?.unwrap_or_default());
				}
				let index = boundary_index(&texts, left, right).map_err(|miss| not_found(miss.describe(candidates, left, right)))?;
				debug!(target = "chatpoll", %kind, index, total = controls.len(), "located between text boundaries");
				Ok(controls.swap_remove(index))
			}
			ControlLocator::Role { role, name } => {
				for control in document.query_all(&role.candidates()).await? {
					if let Some(explicit) = control.attribute("role").await? {
						if !explicit.split_whitespace().any(|r| r == role.as_str()) {
							continue;
						}
					}
					let Some(name) = name else {
						return Ok(control);
					};
					if accessible_text(control.as_ref()).await?.contains(name.as_str()) {
						debug!(target = "chatpoll", %kind, role = role.as_str(), name, "located by role");
						return Ok(control);
					}
				}
				Err(not_found(match name {
					Some(name) => format!("no {} named {name:?}", role.as_str()),
					None => format!("no {}", role.as_str()),
				}))
			}
		}
	}
}

/// Text used for name matching: `aria-label`, then `value`, then content.
async fn accessible_text(control: &dyn crate::dom::Control) -> Result<String> {
	let mut text = control.text_content().await?.unwrap_or_default();
	for attribute in ["aria-label", "value"] {
		if let Some(value) = control.attribute(attribute).await? {
			text.push(' ');
			text.push_str(&value);
		}
	}
	Ok(text)
}

/// Why [`boundary_index`] found no control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMiss {
	Left,
	Right,
	NothingBetween { left: usize, right: usize },
}

impl BoundaryMiss {
	fn describe(self, candidates: &Selector, left: &str, right: &str) -> String {
		match self {
			BoundaryMiss::Left => format!("no {candidates} contains {left:?}"),
			BoundaryMiss::Right => format!("no {candidates} contains {right:?}"),
			BoundaryMiss::NothingBetween { left: l, right: r } => {
				format!("nothing strictly between {left:?} (#{l}) and {right:?} (#{r})")
			}
		}
	}
}

/// Index of the first text strictly between the left and right markers.
///
/// The last text containing a marker defines that boundary. A text that
/// contains `left` is never tested for `right`.
pub fn boundary_index<S: AsRef<str>>(texts: &[S], left: &str, right: &str) -> std::result::Result<usize, BoundaryMiss> {
	let mut left_at = None;
	let mut right_at = None;
	for (i, text) in texts.iter().enumerate() {
		let text = text.as_ref();
		if text.contains(left) {
			left_at = Some(i);
		} else if text.contains(right) {
			right_at = Some(i);
		}
	}
	let left_at = left_at.ok_or(BoundaryMiss::Left)?;
	let right_at = right_at.ok_or(BoundaryMiss::Right)?;
	if left_at + 1 < right_at {
		Ok(left_at + 1)
	} else {
		Err(BoundaryMiss::NothingBetween {
			left: left_at,
			right: right_at,
		})
	}
}
