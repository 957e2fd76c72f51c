//! Interim-state detection for the response poller.
//!
//! Chat pages often render a placeholder ("thinking...", a model banner)
//! before the real reply streams in. Ticks whose text is interim are skipped
//! by the poller without touching its stored observation.

/// Decides whether a response text is still an interim rendering.
pub trait InterimState: Send + Sync {
	fn is_interim(&self, text: &str) -> bool;
}

impl<F> InterimState for F
where
	F: Fn(&str) -> bool + Send + Sync,
{
	fn is_interim(&self, text: &str) -> bool {
		self(text)
	}
}

/// Interim when any configured marker occurs as a substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
	markers: Vec<String>,
}

impl MarkerSet {
	/// Builds a set from marker strings; empty markers are dropped since they
	/// would match every text.
	pub fn new<I, S>(markers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			markers: markers.into_iter().map(Into::into).filter(|m: &String| !m.is_empty()).collect(),
		}
	}

	pub fn markers(&self) -> &[String] {
		&self.markers
	}
}

impl InterimState for MarkerSet {
	fn is_interim(&self, text: &str) -> bool {
		self.markers.iter().any(|marker| text.contains(marker.as_str()))
	}
}
