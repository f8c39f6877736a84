use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Serialize;

use crate::MetadocError;
use crate::MetadocResult;
use crate::config::ScanConfig;

/// The deployment flavor of a module directory. The directory's final path
/// segment names its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ModuleType {
	/// Woven into the agent at runtime.
	#[serde(rename = "javaagent")]
	JavaAgent,
	/// Published as a standalone library.
	#[serde(rename = "library")]
	Library,
}

impl ModuleType {
	pub const ALL: [ModuleType; 2] = [ModuleType::JavaAgent, ModuleType::Library];

	/// The directory name that marks a module of this type.
	pub fn segment(self) -> &'static str {
		match self {
			Self::JavaAgent => "javaagent",
			Self::Library => "library",
		}
	}

	pub fn from_segment(segment: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|ty| ty.segment() == segment)
	}
}

impl fmt::Display for ModuleType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.segment())
	}
}

/// One discovered module directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePath {
	/// Absolute path of the module directory.
	pub path: PathBuf,
	/// Path relative to the source root, `/`-separated.
	pub relative_path: String,
	/// The segment immediately above the type segment.
	pub name: String,
	/// Prefix of `name` before the first `-`, or the whole name.
	pub namespace: String,
	pub group: String,
	pub module_type: ModuleType,
}

impl ModulePath {
	/// The relative path with the trailing type segment removed. Every
	/// module type of one logical module shares this path.
	pub fn canonical_path(&self) -> &str {
		self.relative_path
			.strip_suffix(self.module_type.segment())
			.map_or(self.relative_path.as_str(), |rest| {
				rest.strip_suffix('/').unwrap_or(rest)
			})
	}
}

/// Classify a single `/`-separated path relative to the source root.
///
/// Returns `None` when the path does not have the shape of a module
/// directory: it must contain the `container` segment, end in a type
/// segment, contain at most one `javaagent` segment, and avoid test,
/// shared-testing, `-common`, and bootstrap-source segments. A root that is
/// itself the container directory counts as the container segment.
pub fn classify_path(root: &Path, relative: &str, container: &str) -> Option<ModulePath> {
	let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
	let (last, parents) = segments.split_last()?;
	let module_type = ModuleType::from_segment(last)?;
	// `None` when the root itself is the container directory.
	let container_index = match segments.iter().position(|s| *s == container) {
		Some(index) => Some(index),
		None if root_is_container(root, container) => None,
		None => return None,
	};

	let agent_segments = segments
		.iter()
		.filter(|s| **s == ModuleType::JavaAgent.segment())
		.count();
	if agent_segments > 1 || has_denied_segment(&segments) {
		return None;
	}

	let name_index = parents.len().checked_sub(1)?;
	if container_index.is_some_and(|index| name_index <= index) {
		return None;
	}

	let name = parents[name_index];
	let namespace = match name.split_once('-') {
		Some((prefix, _)) if !prefix.is_empty() => prefix,
		_ => name,
	};
	let relative_path = segments.join("/");

	Some(ModulePath {
		path: root.join(&relative_path),
		relative_path,
		name: name.to_string(),
		namespace: namespace.to_string(),
		group: namespace.to_string(),
		module_type,
	})
}

fn root_is_container(root: &Path, container: &str) -> bool {
	let name = match root.file_name() {
		Some(name) => Some(name.to_os_string()),
		None => {
			root.canonicalize()
				.ok()
				.and_then(|path| path.file_name().map(|name| name.to_os_string()))
		}
	};
	name.is_some_and(|name| name == container)
}

fn has_denied_segment(segments: &[&str]) -> bool {
	segments.iter().enumerate().any(|(index, segment)| {
		*segment == "test"
			|| segment.starts_with("testing")
			|| segment.ends_with("-common")
			|| (*segment == "bootstrap" && segments.get(index + 1) == Some(&"src"))
	})
}

/// Walk `root` and return every module directory, sorted by relative path.
///
/// Unreadable directories and symlink cycles are logged and skipped. Each
/// call walks the tree afresh.
pub fn classify(root: &Path, config: &ScanConfig) -> MetadocResult<Vec<ModulePath>> {
	if !root.is_dir() {
		return Err(MetadocError::RootNotFound {
			path: root.display().to_string(),
		});
	}

	let gitignore = if config.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &config.exclude)?;
	let mut modules = Vec::new();
	let mut visited_dirs = HashSet::new();

	walk_dir(
		root,
		root,
		&config.container,
		&gitignore,
		&custom_exclude,
		&mut visited_dirs,
		&mut modules,
	);

	modules.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
	tracing::debug!(count = modules.len(), root = %root.display(), "classified module paths");

	Ok(modules)
}

/// Build a `Gitignore` matcher from `[scan] exclude` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MetadocResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		// Gitignore lines accept any text, so check the glob syntax first.
		let glob = pattern.trim_start_matches('!').trim_end_matches('/');
		Glob::new(glob).map_err(|e| MetadocError::InvalidPattern {
			pattern: pattern.clone(),
			reason: e.kind().to_string(),
		})?;
		builder
			.add_line(None, pattern)
			.map_err(|e| MetadocError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			})?;
	}
	builder
		.build()
		.map_err(|e| MetadocError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the root's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Directories that never contain module roots.
fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "build" || name == "node_modules" || name == "src"
}

fn walk_dir(
	root: &Path,
	dir: &Path,
	container: &str,
	gitignore: &Gitignore,
	custom_exclude: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
	modules: &mut Vec<ModulePath>,
) {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		tracing::warn!(path = %dir.display(), "symlink cycle detected, skipping");
		return;
	}

	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(e) => {
			tracing::warn!(path = %dir.display(), error = %e, "unable to read directory");
			return;
		}
	};

	let mut children: Vec<PathBuf> = entries
		.filter_map(Result::ok)
		.map(|entry| entry.path())
		.filter(|path| path.is_dir())
		.collect();
	children.sort();

	for path in children {
		let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
			continue;
		};
		if is_ignored_directory_name(name)
			|| gitignore.matched(&path, true).is_ignore()
			|| custom_exclude.matched(&path, true).is_ignore()
		{
			continue;
		}

		if let Some(relative) = relative_path(root, &path) {
			if let Some(module) = classify_path(root, &relative, container) {
				tracing::debug!(path = %module.relative_path, ty = %module.module_type, "found module");
				modules.push(module);
			}
		}

		walk_dir(
			root,
			&path,
			container,
			gitignore,
			custom_exclude,
			visited_dirs,
			modules,
		);
	}
}

/// `/`-joined path of `path` relative to `base`, or `None` when the path is
/// outside `base` or not valid UTF-8.
pub fn relative_path(base: &Path, path: &Path) -> Option<String> {
	let relative = path.strip_prefix(base).ok()?;
	let segments: Option<Vec<&str>> = relative.iter().map(|s| s.to_str()).collect();
	Some(segments?.join("/"))
}

/// Telemetry declaration files of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryFiles {
	pub scope: Option<PathBuf>,
	pub metrics: Vec<PathBuf>,
	pub spans: Vec<PathBuf>,
}

impl TelemetryFiles {
	pub fn is_empty(&self) -> bool {
		self.scope.is_none() && self.metrics.is_empty() && self.spans.is_empty()
	}
}

/// Files that belong to one module root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFiles {
	/// Source files, excluding build output and test trees.
	pub sources: Vec<PathBuf>,
	/// Build descriptors, excluding shared-testing subtrees.
	pub descriptors: Vec<PathBuf>,
	/// The sidecar description file, if present.
	pub metadata: Option<PathBuf>,
	pub telemetry: TelemetryFiles,
}

/// Locate every companion file under `module_root`. All lists are sorted.
pub fn find_module_files(module_root: &Path, config: &ScanConfig) -> ModuleFiles {
	let files = list_files(module_root);

	ModuleFiles {
		sources: filter_source_files(module_root, &files, &config.source_extension),
		descriptors: filter_build_descriptors(module_root, &files, &config.descriptor),
		metadata: find_metadata_file(module_root, &config.metadata_file),
		telemetry: find_telemetry_files(module_root, &config.telemetry_dir),
	}
}

/// Source files with the given extension, skipping `build` and `test`
/// subtrees.
pub fn find_source_files(module_root: &Path, extension: &str) -> Vec<PathBuf> {
	filter_source_files(module_root, &list_files(module_root), extension)
}

/// Build descriptors named exactly `file_name`, skipping `testing` subtrees.
pub fn find_build_descriptors(module_root: &Path, file_name: &str) -> Vec<PathBuf> {
	filter_build_descriptors(module_root, &list_files(module_root), file_name)
}

pub fn find_metadata_file(module_root: &Path, file_name: &str) -> Option<PathBuf> {
	let path = module_root.join(file_name);
	path.is_file().then_some(path)
}

/// Split the files of the telemetry directory into scope, metrics, and
/// spans declarations.
pub fn find_telemetry_files(module_root: &Path, telemetry_dir: &str) -> TelemetryFiles {
	let dir = module_root.join(telemetry_dir);
	let Ok(entries) = std::fs::read_dir(&dir) else {
		return TelemetryFiles::default();
	};

	let kinds = telemetry_glob_set();
	let mut paths: Vec<PathBuf> = entries
		.filter_map(Result::ok)
		.map(|entry| entry.path())
		.filter(|path| path.is_file())
		.collect();
	paths.sort();

	let mut telemetry = TelemetryFiles::default();
	for path in paths {
		let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
			continue;
		};
		match kinds.matches(name).first() {
			Some(0) => telemetry.scope = Some(path),
			Some(1) => telemetry.metrics.push(path),
			Some(2) => telemetry.spans.push(path),
			_ => {}
		}
	}

	telemetry
}

fn telemetry_glob_set() -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in ["scope.yaml", "metrics-*", "spans-*"] {
		if let Ok(glob) = Glob::new(pattern) {
			builder.add(glob);
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// The module type a descriptor belongs to, judged by the type segment on
/// its path below `module_root`.
pub fn descriptor_module_type(module_root: &Path, descriptor: &Path) -> Option<ModuleType> {
	let relative = relative_path(module_root, descriptor)?;
	let segments: Vec<&str> = relative.split('/').collect();
	ModuleType::ALL
		.into_iter()
		.find(|ty| segments.contains(&ty.segment()))
}

fn filter_source_files(module_root: &Path, files: &[PathBuf], extension: &str) -> Vec<PathBuf> {
	files
		.iter()
		.filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
		.filter(|path| {
			!has_relative_segment(module_root, path, |segment| {
				segment == "build" || segment == "test"
			})
		})
		.cloned()
		.collect()
}

fn filter_build_descriptors(
	module_root: &Path,
	files: &[PathBuf],
	file_name: &str,
) -> Vec<PathBuf> {
	files
		.iter()
		.filter(|path| path.file_name().and_then(|n| n.to_str()) == Some(file_name))
		.filter(|path| !has_relative_segment(module_root, path, |segment| segment == "testing"))
		.cloned()
		.collect()
}

fn has_relative_segment(base: &Path, path: &Path, predicate: impl Fn(&str) -> bool) -> bool {
	relative_path(base, path).is_some_and(|relative| relative.split('/').any(&predicate))
}

/// Every regular file below `dir`, sorted. Hidden and `build` directories
/// are not entered.
fn list_files(dir: &Path) -> Vec<PathBuf> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();
	collect_files(dir, &mut files, &mut visited_dirs);
	files.sort();
	files
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>, visited_dirs: &mut HashSet<PathBuf>) {
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return;
	}

	let Ok(entries) = std::fs::read_dir(dir) else {
		tracing::warn!(path = %dir.display(), "unable to read directory");
		return;
	};

	for entry in entries.filter_map(Result::ok) {
		let path = entry.path();
		if path.is_dir() {
			let skip = path
				.file_name()
				.and_then(|n| n.to_str())
				.is_none_or(|name| name.starts_with('.') || name == "build");
			if !skip {
				collect_files(&path, files, visited_dirs);
			}
		} else if path.is_file() {
			files.push(path);
		}
	}
}
