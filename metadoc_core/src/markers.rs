use std::path::Path;

use crate::MetadocResult;

pub const DEFAULT_COMPONENT_PREFIX: &str = "COMPONENT:";
pub const DEFAULT_SOURCE_PREFIX: &str = "SOURCE:";

/// Outcome of reconciling one marker pair.
///
/// A failed reconciliation carries only its message, so success and error
/// can never both be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
	Updated {
		/// The full document after the splice.
		content: String,
		/// Whether `content` differs from the input byte for byte.
		changed: bool,
	},
	Failed {
		message: String,
	},
}

impl UpdateResult {
	pub fn success(content: String, changed: bool) -> Self {
		Self::Updated { content, changed }
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self::Failed {
			message: message.into(),
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, Self::Updated { .. })
	}

	/// Always `false` for a failure.
	pub fn has_changes(&self) -> bool {
		matches!(self, Self::Updated { changed: true, .. })
	}

	pub fn content(&self) -> Option<&str> {
		match self {
			Self::Updated { content, .. } => Some(content),
			Self::Failed { .. } => None,
		}
	}

	pub fn error_message(&self) -> Option<&str> {
		match self {
			Self::Updated { .. } => None,
			Self::Failed { message } => Some(message),
		}
	}
}

/// A begin and end marker line for one `(component, source)` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPair {
	pub begin: String,
	pub end: String,
}

/// Replaces generated regions of hand-maintained documents.
///
/// A region is delimited by HTML comments:
///
/// ```text
/// <!-- BEGIN-GENERATED: COMPONENT:disable-list SOURCE:opentelemetry-java-instrumentation -->
/// generated content
/// <!-- END-GENERATED: COMPONENT:disable-list SOURCE:opentelemetry-java-instrumentation -->
/// ```
///
/// Text outside a region is never touched and missing regions are never
/// created.
#[derive(Debug, Clone)]
pub struct MarkerUpdater {
	component_prefix: String,
	source_prefix: String,
}

impl Default for MarkerUpdater {
	fn default() -> Self {
		Self::new()
	}
}

impl MarkerUpdater {
	pub fn new() -> Self {
		Self::with_prefixes(DEFAULT_COMPONENT_PREFIX, DEFAULT_SOURCE_PREFIX)
	}

	pub fn with_prefixes(component_prefix: impl Into<String>, source_prefix: impl Into<String>) -> Self {
		Self {
			component_prefix: component_prefix.into(),
			source_prefix: source_prefix.into(),
		}
	}

	pub fn markers(&self, component: &str, source: &str) -> MarkerPair {
		let id = format!(
			"{}{component} {}{source}",
			self.component_prefix, self.source_prefix
		);
		MarkerPair {
			begin: format!("<!-- BEGIN-GENERATED: {id} -->"),
			end: format!("<!-- END-GENERATED: {id} -->"),
		}
	}

	/// Replace the first region for `(component, source)` with the trimmed
	/// `new_content`.
	pub fn update_content(
		&self,
		document: &str,
		component: &str,
		source: &str,
		new_content: &str,
	) -> UpdateResult {
		let markers = self.markers(component, source);
		let Some((start, end)) = find_region(document, &markers) else {
			return UpdateResult::failure(format!(
				"Markers not found for component '{component}' and source '{source}'"
			));
		};

		let replacement = format!("{}\n{}\n{}", markers.begin, new_content.trim(), markers.end);
		let mut updated =
			String::with_capacity(document.len() - (end - start) + replacement.len());
		updated.push_str(&document[..start]);
		updated.push_str(&replacement);
		updated.push_str(&document[end..]);

		let changed = updated != document;
		UpdateResult::success(updated, changed)
	}

	/// Reconcile a document on disk, writing it back only when the region
	/// changed.
	pub fn update_file(
		&self,
		path: &Path,
		component: &str,
		source: &str,
		new_content: &str,
	) -> MetadocResult<UpdateResult> {
		if !path.is_file() {
			return Ok(UpdateResult::failure(format!(
				"File not found: {}",
				path.display()
			)));
		}

		let document = std::fs::read_to_string(path)?;
		let result = self.update_content(&document, component, source, new_content);
		if let Some(content) = result.content().filter(|_| result.has_changes()) {
			std::fs::write(path, content)?;
			tracing::debug!(path = %path.display(), component, "updated generated region");
		}

		Ok(result)
	}

	/// Whether `document` holds a complete region for `(component, source)`.
	pub fn has_markers(&self, document: &str, component: &str, source: &str) -> bool {
		find_region(document, &self.markers(component, source)).is_some()
	}
}

/// Byte span from the start of the first begin marker to the end of the
/// nearest end marker after it.
fn find_region(document: &str, markers: &MarkerPair) -> Option<(usize, usize)> {
	let start = document.find(&markers.begin)?;
	let search_from = start + markers.begin.len();
	let end = document[search_from..].find(&markers.end)? + search_from + markers.end.len();
	Some((start, end))
}
