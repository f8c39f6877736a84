use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::MetadocError;
use crate::MetadocResult;
use crate::classifier::ModulePath;
use crate::classifier::ModuleType;
use crate::classifier::TelemetryFiles;
use crate::descriptor::DependencyInfo;

/// A tunable setting read by a module. Equality is by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConfigurationProperty {
	/// The property key, e.g. `otel.instrumentation.foo.enabled`.
	pub name: String,
	/// Declared type as written at the declaration site.
	#[serde(rename = "type")]
	pub r#type: String,
	/// Default value literal, absent for single-argument accessors.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default: Option<String>,
}

impl ConfigurationProperty {
	pub fn new(name: impl Into<String>, r#type: impl Into<String>, default: Option<String>) -> Self {
		Self {
			name: name.into(),
			r#type: r#type.into(),
			default,
		}
	}
}

/// Human-authored description loaded from a module's sidecar file.
///
/// ```yaml
/// description: Instruments the OkHttp client.
/// display_name: OkHttp
/// library_link: https://square.github.io/okhttp/
/// semantic_conventions:
///   - HTTP_CLIENT_SPANS
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ModuleMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub library_link: Option<String>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub disabled_by_default: bool,
	/// Enum-style convention identifiers such as `HTTP_SERVER_SPANS`.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub semantic_conventions: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub configurations: Vec<DocumentedConfiguration>,
}

/// A setting described by hand in the sidecar file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DocumentedConfiguration {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub r#type: Option<String>,
	/// Any scalar; `false`, `10` and `"x"` are all accepted.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default: Option<serde_yaml_ng::Value>,
}

impl ModuleMetadata {
	pub fn parse(content: &str) -> Result<Self, serde_yaml_ng::Error> {
		if content.trim().is_empty() {
			return Ok(Self::default());
		}
		serde_yaml_ng::from_str(content)
	}

	pub fn load(path: &Path) -> MetadocResult<Self> {
		let content = std::fs::read_to_string(path)?;
		Self::parse(&content).map_err(|e| {
			MetadocError::MetadataParse {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})
	}
}

/// One logical module, merged across all of its module types.
///
/// Identity is the `(group, namespace, name)` key; two entities with the
/// same key compare equal regardless of what has been collected.
#[derive(Debug, Clone)]
pub struct InstrumentationEntity {
	/// Absolute path of the module directory without its type segment.
	pub path: PathBuf,
	/// `path` relative to the source root.
	pub src_path: String,
	pub name: String,
	pub namespace: String,
	pub group: String,
	/// Module types in the order they were first seen.
	pub types: Vec<ModuleType>,
	pub target_versions: BTreeMap<ModuleType, BTreeSet<String>>,
	/// Highest minimum platform version across all descriptors.
	pub min_java_version: Option<u32>,
	pub configurations: Vec<ConfigurationProperty>,
	/// Semantic capabilities detected in sources.
	pub semantic_tags: BTreeSet<String>,
	/// Span kinds detected in sources.
	pub span_kinds: BTreeSet<String>,
	pub metadata: Option<ModuleMetadata>,
	pub telemetry: TelemetryFiles,
}

impl InstrumentationEntity {
	/// Create an entity keyed by `module` with no collected facts.
	pub fn new(module: &ModulePath) -> Self {
		let src_path = module.canonical_path().to_string();
		let path = module
			.path
			.parent()
			.map_or_else(|| module.path.clone(), Path::to_path_buf);

		Self {
			path,
			src_path,
			name: module.name.clone(),
			namespace: module.namespace.clone(),
			group: module.group.clone(),
			types: Vec::new(),
			target_versions: BTreeMap::new(),
			min_java_version: None,
			configurations: Vec::new(),
			semantic_tags: BTreeSet::new(),
			span_kinds: BTreeSet::new(),
			metadata: None,
			telemetry: TelemetryFiles::default(),
		}
	}

	pub fn key(&self) -> (&str, &str, &str) {
		(&self.group, &self.namespace, &self.name)
	}

	pub fn has_type(&self, module_type: ModuleType) -> bool {
		self.types.contains(&module_type)
	}

	/// Record a module type, keeping first-seen order.
	pub fn add_type(&mut self, module_type: ModuleType) {
		if !self.has_type(module_type) {
			self.types.push(module_type);
		}
	}

	/// Merge one descriptor's resolution into the target versions of
	/// `module_type`.
	pub fn add_dependency_info(&mut self, module_type: ModuleType, info: DependencyInfo) {
		if !info.versions.is_empty() {
			self.target_versions
				.entry(module_type)
				.or_default()
				.extend(info.versions);
		}
		self.min_java_version = self.min_java_version.max(info.min_java_version);
	}

	/// Add a configuration property unless one with the same name exists.
	pub fn add_configuration(&mut self, property: ConfigurationProperty) {
		if !self.configurations.iter().any(|p| p.name == property.name) {
			self.configurations.push(property);
		}
	}

	/// Display name from metadata, falling back to the module name.
	pub fn display_name(&self) -> &str {
		self.metadata
			.as_ref()
			.and_then(|m| m.display_name.as_deref())
			.filter(|name| !name.is_empty())
			.unwrap_or(&self.name)
	}

	/// The instrumentation scope name the module reports telemetry under.
	pub fn scope_name(&self) -> String {
		format!("io.opentelemetry.{}", self.name)
	}
}

impl PartialEq for InstrumentationEntity {
	fn eq(&self, other: &Self) -> bool {
		self.key() == other.key()
	}
}

impl Eq for InstrumentationEntity {}
