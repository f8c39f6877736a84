use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use crate::MetadocError;
use crate::MetadocResult;
use crate::config::DocTarget;
use crate::config::DocsConfig;
use crate::entity::InstrumentationEntity;
use crate::markers::MarkerUpdater;
use crate::markers::UpdateResult;
use crate::render::render_target;

/// File at the source root that declares the project version.
pub const VERSION_FILE: &str = "version.gradle.kts";
const VERSION_ASSIGNMENT: &str = "version = \"";
const FALLBACK_VERSION: &str = "latest";

/// The inputs for reconciling one documentation checkout.
#[derive(Debug)]
pub struct DocsContext<'a> {
	/// Directory holding the target documents.
	pub agent_dir: PathBuf,
	pub docs: &'a DocsConfig,
	pub entities: &'a [InstrumentationEntity],
	/// Label rendered into every generated footer.
	pub version: String,
}

impl<'a> DocsContext<'a> {
	/// Build a context rooted at `docs_root`. Fails when the documentation
	/// directory or its agent subdirectory is missing.
	pub fn new(
		docs_root: &Path,
		docs: &'a DocsConfig,
		entities: &'a [InstrumentationEntity],
		version: impl Into<String>,
	) -> MetadocResult<Self> {
		if !docs_root.is_dir() {
			return Err(MetadocError::TargetDirNotFound {
				path: docs_root.display().to_string(),
			});
		}

		let agent_dir = docs_root.join(&docs.agent_dir);
		if !agent_dir.is_dir() {
			return Err(MetadocError::TargetDirNotFound {
				path: agent_dir.display().to_string(),
			});
		}

		Ok(Self {
			agent_dir,
			docs,
			entities,
			version: version.into(),
		})
	}

	pub fn target_path(&self, target: &DocTarget) -> PathBuf {
		self.agent_dir.join(&target.file)
	}
}

/// A target that could not be reconciled. Other targets are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
	pub file: PathBuf,
	pub component: String,
	pub message: String,
}

/// A document whose generated regions are out of date.
#[derive(Debug, Clone)]
pub struct StaleDocument {
	pub file: PathBuf,
	/// Components whose region would change, in target order.
	pub components: Vec<String>,
	pub current_content: String,
	pub expected_content: String,
}

/// Result of checking every doc target.
#[derive(Debug, Default)]
pub struct CheckResult {
	pub stale: Vec<StaleDocument>,
	pub failures: Vec<TargetFailure>,
	/// Number of configured targets.
	pub target_count: usize,
}

impl CheckResult {
	/// Returns true if every target is present and up to date.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty() && self.failures.is_empty()
	}

	pub fn has_failures(&self) -> bool {
		!self.failures.is_empty()
	}

	/// Returns true if there were targets and none of them succeeded.
	pub fn all_failed(&self) -> bool {
		self.target_count > 0 && self.failures.len() == self.target_count
	}
}

/// Documents to write after reconciling every doc target.
#[derive(Debug, Default)]
pub struct DocsUpdate {
	/// Documents that changed and their new content.
	pub updated_files: BTreeMap<PathBuf, String>,
	/// Number of regions whose content changed.
	pub updated_count: usize,
	pub failures: Vec<TargetFailure>,
	pub target_count: usize,
}

impl DocsUpdate {
	pub fn all_failed(&self) -> bool {
		self.target_count > 0 && self.failures.len() == self.target_count
	}
}

/// Working state for one document shared by several targets.
struct Document {
	original: String,
	current: String,
	changed_components: Vec<String>,
}

struct Reconciled {
	documents: BTreeMap<PathBuf, Document>,
	failures: Vec<TargetFailure>,
	updated_count: usize,
}

/// Render every target and splice it into its document in memory.
/// Targets sharing a document are applied in order to the same text.
fn reconcile(ctx: &DocsContext<'_>) -> Reconciled {
	let updater = MarkerUpdater::new();
	let source = ctx.docs.source_id.as_str();
	let mut documents: BTreeMap<PathBuf, Document> = BTreeMap::new();
	let mut failures = Vec::new();
	let mut updated_count = 0;

	for target in &ctx.docs.targets {
		let path = ctx.target_path(target);
		let fail = |message: String| {
			tracing::warn!(path = %path.display(), component = %target.component, "{message}");
			TargetFailure {
				file: path.clone(),
				component: target.component.clone(),
				message,
			}
		};

		if !documents.contains_key(&path) {
			if !path.is_file() {
				failures.push(fail(format!("File not found: {}", path.display())));
				continue;
			}
			match std::fs::read_to_string(&path) {
				Ok(content) => {
					documents.insert(
						path.clone(),
						Document {
							current: content.clone(),
							original: content,
							changed_components: Vec::new(),
						},
					);
				}
				Err(e) => {
					failures.push(fail(format!("Unable to read {}: {e}", path.display())));
					continue;
				}
			}
		}

		let Some(document) = documents.get_mut(&path) else {
			continue;
		};
		let rendered = render_target(target.content, ctx.entities, &ctx.version);

		match updater.update_content(&document.current, &target.component, source, &rendered) {
			UpdateResult::Updated { content, changed } => {
				if changed {
					document.current = content;
					document.changed_components.push(target.component.clone());
					updated_count += 1;
				}
				tracing::debug!(path = %path.display(), component = %target.component, changed, "reconciled target");
			}
			UpdateResult::Failed { message } => failures.push(fail(message)),
		}
	}

	Reconciled {
		documents,
		failures,
		updated_count,
	}
}

/// Check whether every generated region is up to date. Missing documents
/// and marker pairs are collected as failures rather than aborting, so
/// the check reports all problems in a single pass.
pub fn check_docs(ctx: &DocsContext<'_>) -> CheckResult {
	let reconciled = reconcile(ctx);
	let stale = reconciled
		.documents
		.into_iter()
		.filter(|(_, document)| document.current != document.original)
		.map(|(file, document)| {
			StaleDocument {
				file,
				components: document.changed_components,
				current_content: document.original,
				expected_content: document.current,
			}
		})
		.collect();

	CheckResult {
		stale,
		failures: reconciled.failures,
		target_count: ctx.docs.targets.len(),
	}
}

/// Compute the new content of every document with a changed region.
pub fn compute_updates(ctx: &DocsContext<'_>) -> DocsUpdate {
	let reconciled = reconcile(ctx);
	let updated_files = reconciled
		.documents
		.into_iter()
		.filter(|(_, document)| document.current != document.original)
		.map(|(file, document)| (file, document.current))
		.collect();

	DocsUpdate {
		updated_files,
		updated_count: reconciled.updated_count,
		failures: reconciled.failures,
		target_count: ctx.docs.targets.len(),
	}
}

/// Write the updated contents back to disk.
pub fn write_updates(updates: &DocsUpdate) -> MetadocResult<()> {
	for (path, content) in &updates.updated_files {
		std::fs::write(path, content)?;
	}
	Ok(())
}

/// Read the project version from `version.gradle.kts` under `root`,
/// rendered as `v{version}`, or `latest` when it cannot be found.
pub fn detect_version(root: &Path) -> String {
	let path = root.join(VERSION_FILE);
	let content = match std::fs::read_to_string(&path) {
		Ok(content) => content,
		Err(e) => {
			if path.exists() {
				tracing::warn!(path = %path.display(), error = %e, "could not detect version");
			}
			return FALLBACK_VERSION.to_string();
		}
	};

	content
		.find(VERSION_ASSIGNMENT)
		.map(|start| &content[start + VERSION_ASSIGNMENT.len()..])
		.and_then(|rest| rest.find('"').map(|end| &rest[..end]))
		.filter(|version| !version.is_empty())
		.map_or_else(|| FALLBACK_VERSION.to_string(), |version| format!("v{version}"))
}

/// The version label to render: an explicit value wins over the configured
/// one, which wins over [`detect_version`].
pub fn resolve_version(explicit: Option<&str>, docs: &DocsConfig, root: &Path) -> String {
	explicit
		.or(docs.version.as_deref())
		.map_or_else(|| detect_version(root), ToString::to_string)
}
