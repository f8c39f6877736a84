use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::MetadocError;
use crate::MetadocResult;
use crate::classifier::ModuleType;
use crate::classifier::relative_path;
use crate::entity::ConfigurationProperty;
use crate::entity::DocumentedConfiguration;
use crate::entity::InstrumentationEntity;

/// The `libraries` document: entities keyed by group, each group ordered
/// by module name.
#[derive(Debug, Serialize)]
pub struct Listing<'a> {
	pub libraries: BTreeMap<&'a str, Vec<EntityListing<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct EntityListing<'a> {
	pub name: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub library_link: Option<&'a str>,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub disabled_by_default: bool,
	pub namespace: &'a str,
	pub source_path: &'a str,
	pub types: &'a [ModuleType],
	pub scope: ScopeListing,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub minimum_java_version: Option<u32>,
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub target_versions: &'a BTreeMap<ModuleType, BTreeSet<String>>,
	#[serde(skip_serializing_if = "<[_]>::is_empty")]
	pub configurations: &'a [ConfigurationProperty],
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub semantic_conventions: Vec<&'a str>,
	#[serde(skip_serializing_if = "BTreeSet::is_empty")]
	pub semantic_tags: &'a BTreeSet<String>,
	#[serde(skip_serializing_if = "BTreeSet::is_empty")]
	pub span_kinds: &'a BTreeSet<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub metadata_configurations: Option<&'a [DocumentedConfiguration]>,
	#[serde(skip_serializing_if = "TelemetryListing::is_empty")]
	pub telemetry: TelemetryListing,
}

#[derive(Debug, Serialize)]
pub struct ScopeListing {
	pub name: String,
}

/// Telemetry declaration files relative to the entity directory.
#[derive(Debug, Default, Serialize)]
pub struct TelemetryListing {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub metrics: Vec<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub spans: Vec<String>,
}

impl TelemetryListing {
	pub fn is_empty(&self) -> bool {
		self.scope.is_none() && self.metrics.is_empty() && self.spans.is_empty()
	}
}

impl<'a> Listing<'a> {
	pub fn new(entities: &'a [InstrumentationEntity]) -> Self {
		let mut libraries: BTreeMap<&str, Vec<EntityListing<'a>>> = BTreeMap::new();

		for entity in entities {
			libraries
				.entry(entity.group.as_str())
				.or_default()
				.push(EntityListing::new(entity));
		}

		for group in libraries.values_mut() {
			group.sort_by(|a, b| a.name.cmp(b.name).then_with(|| a.namespace.cmp(b.namespace)));
		}

		Self { libraries }
	}

	pub fn to_yaml(&self) -> MetadocResult<String> {
		serde_yaml_ng::to_string(self).map_err(|e| MetadocError::Serialize(e.to_string()))
	}

	pub fn to_json(&self) -> MetadocResult<String> {
		serde_json::to_string_pretty(self).map_err(|e| MetadocError::Serialize(e.to_string()))
	}

	/// Total number of entities across every group.
	pub fn len(&self) -> usize {
		self.libraries.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.libraries.is_empty()
	}
}

impl<'a> EntityListing<'a> {
	fn new(entity: &'a InstrumentationEntity) -> Self {
		let metadata = entity.metadata.as_ref();

		Self {
			name: &entity.name,
			display_name: metadata.and_then(|m| m.display_name.as_deref()),
			description: metadata.and_then(|m| m.description.as_deref()),
			library_link: metadata.and_then(|m| m.library_link.as_deref()),
			disabled_by_default: metadata.is_some_and(|m| m.disabled_by_default),
			namespace: &entity.namespace,
			source_path: &entity.src_path,
			types: &entity.types,
			scope: ScopeListing {
				name: entity.scope_name(),
			},
			minimum_java_version: entity.min_java_version,
			target_versions: &entity.target_versions,
			configurations: &entity.configurations,
			semantic_conventions: metadata
				.map(|m| m.semantic_conventions.iter().map(String::as_str).collect())
				.unwrap_or_default(),
			semantic_tags: &entity.semantic_tags,
			span_kinds: &entity.span_kinds,
			metadata_configurations: metadata
				.map(|m| m.configurations.as_slice())
				.filter(|c| !c.is_empty()),
			telemetry: telemetry_listing(entity),
		}
	}
}

fn telemetry_listing(entity: &InstrumentationEntity) -> TelemetryListing {
	let relative = |path: &Path| relative_path(&entity.path, path).unwrap_or_else(|| path.display().to_string());

	TelemetryListing {
		scope: entity.telemetry.scope.as_deref().map(relative),
		metrics: entity.telemetry.metrics.iter().map(|p| relative(p)).collect(),
		spans: entity.telemetry.spans.iter().map(|p| relative(p)).collect(),
	}
}
