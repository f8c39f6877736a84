use std::collections::BTreeMap;
use std::path::Path;

use crate::MetadocResult;
use crate::classifier::ModulePath;
use crate::classifier::classify;
use crate::classifier::descriptor_module_type;
use crate::classifier::find_module_files;
use crate::config::ScanConfig;
use crate::descriptor::resolve;
use crate::entity::ConfigurationProperty;
use crate::entity::InstrumentationEntity;
use crate::entity::ModuleMetadata;
use crate::source_scanner::FsSourceReader;
use crate::source_scanner::SEMANTIC_MARKERS;
use crate::source_scanner::SPAN_KIND_MARKERS;
use crate::source_scanner::SourceReader;
use crate::source_scanner::extract_experimental_config_map;
use crate::source_scanner::scan_for_config_properties;
use crate::source_scanner::scan_for_markers;

/// Merge module paths into one entity per `(group, namespace, name)`.
///
/// Module types accumulate in the order they appear in `modules`. The
/// result is ordered by group, then name.
pub fn aggregate(modules: &[ModulePath]) -> Vec<InstrumentationEntity> {
	let mut entities: BTreeMap<(&str, &str, &str), InstrumentationEntity> = BTreeMap::new();

	for module in modules {
		entities
			.entry((module.group.as_str(), module.namespace.as_str(), module.name.as_str()))
			.or_insert_with(|| InstrumentationEntity::new(module))
			.add_type(module.module_type);
	}

	let mut entities: Vec<InstrumentationEntity> = entities.into_values().collect();
	sort_entities(&mut entities);
	entities
}

/// Order entities by group, then module name.
pub fn sort_entities(entities: &mut [InstrumentationEntity]) {
	entities.sort_by(|a, b| {
		a.group
			.cmp(&b.group)
			.then_with(|| a.name.cmp(&b.name))
			.then_with(|| a.namespace.cmp(&b.namespace))
	});
}

/// Attaches descriptor, source, and sidecar facts to entities.
pub struct Analyzer<'a> {
	config: &'a ScanConfig,
	reader: &'a dyn SourceReader,
	experimental: BTreeMap<String, ConfigurationProperty>,
}

impl<'a> Analyzer<'a> {
	pub fn new(config: &'a ScanConfig, reader: &'a dyn SourceReader) -> Self {
		Self {
			config,
			reader,
			experimental: BTreeMap::new(),
		}
	}

	/// Resolve `ExperimentalConfig.get().method()` call sites through this
	/// table of getters, keyed by `method()`.
	#[must_use]
	pub fn with_experimental_config(
		mut self,
		experimental: BTreeMap<String, ConfigurationProperty>,
	) -> Self {
		self.experimental = experimental;
		self
	}

	/// Resolve every descriptor and scan every source under the entity's
	/// directory, merging the findings into `entity`.
	pub fn enrich(&self, entity: &mut InstrumentationEntity) {
		let files = find_module_files(&entity.path, self.config);

		for descriptor in &files.descriptors {
			let Some(module_type) = descriptor_module_type(&entity.path, descriptor) else {
				tracing::debug!(path = %descriptor.display(), "descriptor outside a module type directory");
				continue;
			};
			match self.reader.read_to_string(descriptor) {
				Ok(content) => entity.add_dependency_info(module_type, resolve(&content, module_type)),
				Err(e) => {
					tracing::warn!(path = %descriptor.display(), error = %e, "skipping unreadable descriptor");
				}
			}
		}

		entity.semantic_tags.extend(
			scan_for_markers(self.reader, &files.sources, &SEMANTIC_MARKERS).into_keys(),
		);
		entity.span_kinds.extend(
			scan_for_markers(self.reader, &files.sources, &SPAN_KIND_MARKERS).into_keys(),
		);

		for property in scan_for_config_properties(self.reader, &files.sources, &self.experimental)
		{
			entity.add_configuration(property);
		}

		if let Some(path) = &files.metadata {
			match ModuleMetadata::load(path) {
				Ok(metadata) => entity.metadata = Some(metadata),
				Err(e) => tracing::warn!(error = %e, "ignoring module metadata"),
			}
		}

		entity.telemetry = files.telemetry;
		tracing::debug!(
			name = %entity.name,
			types = entity.types.len(),
			versions = entity.target_versions.values().map(|v| v.len()).sum::<usize>(),
			"enriched entity"
		);
	}
}

/// Classify, aggregate, and enrich every module under `root`.
pub fn analyze_project(root: &Path, config: &ScanConfig) -> MetadocResult<Vec<InstrumentationEntity>> {
	let modules = classify(root, config)?;
	let mut entities = aggregate(&modules);

	let reader = FsSourceReader;
	let experimental = load_experimental_config(root, config, &reader);
	let analyzer = Analyzer::new(config, &reader).with_experimental_config(experimental);

	for entity in &mut entities {
		analyzer.enrich(entity);
	}

	Ok(entities)
}

fn load_experimental_config(
	root: &Path,
	config: &ScanConfig,
	reader: &dyn SourceReader,
) -> BTreeMap<String, ConfigurationProperty> {
	let Some(relative) = &config.experimental_config else {
		return BTreeMap::new();
	};

	let path = root.join(relative);
	match reader.read_to_string(&path) {
		Ok(content) => extract_experimental_config_map(&content),
		Err(e) => {
			tracing::warn!(path = %path.display(), error = %e, "unable to read experimental config");
			BTreeMap::new()
		}
	}
}
