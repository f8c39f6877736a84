use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::MetadocError;
use crate::MetadocResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"metadoc.toml",
	".metadoc.toml",
	".config/metadoc.toml",
];

/// Identifier written into every marker pair this tool owns.
pub const DEFAULT_SOURCE_ID: &str = "opentelemetry-java-instrumentation";

/// Configuration loaded from a `metadoc.toml` file.
///
/// ```toml
/// [scan]
/// container = "instrumentation"
/// descriptor = "build.gradle.kts"
/// exclude = ["instrumentation/legacy/"]
/// experimental_config = "instrumentation-api-incubator/src/main/java/ExperimentalConfig.java"
///
/// [docs]
/// source_id = "opentelemetry-java-instrumentation"
/// agent_dir = "content/en/docs/zero-code/java/agent"
///
/// [[docs.targets]]
/// file = "disable.md"
/// component = "disable-list"
/// content = "disable-list"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct MetadocConfig {
	/// Settings controlling which directories and files are scanned.
	#[serde(default)]
	pub scan: ScanConfig,
	/// Settings controlling which documents are reconciled.
	#[serde(default)]
	pub docs: DocsConfig,
}

/// Settings for the source tree walk.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
	/// Name of the umbrella directory that holds every module.
	pub container: String,
	/// Exact file name of a module's build descriptor.
	pub descriptor: String,
	/// Extension (without the dot) of source files scanned for facts.
	pub source_extension: String,
	/// Sidecar description file, relative to the module root.
	pub metadata_file: String,
	/// Directory, relative to the module root, holding telemetry declarations.
	pub telemetry_dir: String,
	/// Gitignore-style patterns for paths to skip. Relative to the source
	/// root and applied on top of `.gitignore`.
	pub exclude: Vec<String>,
	/// When true, `.gitignore` files are not consulted.
	pub disable_gitignore: bool,
	/// Shared accessor file whose zero-argument getters can be referenced
	/// from module sources as `ExperimentalConfig.get().method()`.
	pub experimental_config: Option<PathBuf>,
}

impl Default for ScanConfig {
	fn default() -> Self {
		Self {
			container: "instrumentation".to_string(),
			descriptor: "build.gradle.kts".to_string(),
			source_extension: "java".to_string(),
			metadata_file: "metadata.yaml".to_string(),
			telemetry_dir: ".telemetry".to_string(),
			exclude: Vec::new(),
			disable_gitignore: false,
			experimental_config: None,
		}
	}
}

/// Settings for documentation reconciliation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
	/// Source identifier embedded in every marker pair.
	pub source_id: String,
	/// Directory, relative to the documentation root, containing the target
	/// documents.
	pub agent_dir: PathBuf,
	/// Version label for generated footers. Detected from the source tree
	/// when absent.
	pub version: Option<String>,
	/// Documents to reconcile.
	pub targets: Vec<DocTarget>,
}

impl Default for DocsConfig {
	fn default() -> Self {
		Self {
			source_id: DEFAULT_SOURCE_ID.to_string(),
			agent_dir: PathBuf::from("content/en/docs/zero-code/java/agent"),
			version: None,
			targets: vec![
				DocTarget {
					file: PathBuf::from("supported-libraries.md"),
					component: "supported-libraries".to_string(),
					content: TargetContent::SupportedLibraries,
				},
				DocTarget {
					file: PathBuf::from("disable.md"),
					component: "disable-list".to_string(),
					content: TargetContent::DisableList,
				},
			],
		}
	}
}

/// One generated region inside a documentation file.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct DocTarget {
	/// File name relative to `agent_dir`.
	pub file: PathBuf,
	/// Component identifier used in the marker pair.
	pub component: String,
	/// Which renderer produces the region's content.
	pub content: TargetContent,
}

/// The renderer backing a [`DocTarget`].
#[derive(Debug, Clone, Copy, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum TargetContent {
	SupportedLibraries,
	AppServers,
	DisableList,
}

impl MetadocConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> MetadocResult<Option<MetadocConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: MetadocConfig =
			toml::from_str(&content).map_err(|e| MetadocError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Load the config at `root`, falling back to defaults when no file is
	/// present.
	pub fn load_or_default(root: &Path) -> MetadocResult<MetadocConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}
}
