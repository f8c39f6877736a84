use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::entity::ConfigurationProperty;

/// Semantic capabilities and the literal that reveals each one in source.
pub const SEMANTIC_MARKERS: [(&str, &str); 6] = [
	("db_client_metrics", "DbClientMetrics.get()"),
	("db_client_spans", "DbClientSpanNameExtractor"),
	("network_attributes", "NetworkAttributesGetter"),
	("rpc_attributes", "RpcAttributesGetter"),
	("http_client_attributes", "HttpClientAttributesGetter"),
	("http_server_attributes", "HttpServerAttributesGetter"),
];

/// Span kinds and the instrumenter factory call that produces them.
pub const SPAN_KIND_MARKERS: [(&str, &str); 2] = [
	("CLIENT", "JavaagentHttpClientInstrumenters.create"),
	("SERVER", "JavaagentHttpServerInstrumenters.create"),
];

/// Call-site prefix for getters on the shared experimental config.
pub const EXPERIMENTAL_CONFIG_ACCESSOR: &str = "ExperimentalConfig.get().";

static CONFIG_FIELD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"private static final (\w+) \w+ =\s*AgentInstrumentationConfig\.get\(\)\s*\.get(\w+)\("([^"]+)",\s*([^)]+)\);"#,
	)
	.expect("invalid config field pattern")
});

static CONFIG_GETTER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r#"public\s+\w+\s+(\w+)\s*\(\)\s*\{[^}]*?config\.(\w+)\(\s*"([^"]+)"\s*(?:,\s*((?:[^()]|\([^()]*\))+?))?\s*\)"#,
	)
	.expect("invalid config getter pattern")
});

/// Opens source files for the scanners. Unreadable files are skipped by
/// every scanner, so implementations only report the I/O error.
pub trait SourceReader {
	fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>>;

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		let mut content = String::new();
		self.open(path)?.read_to_string(&mut content)?;
		Ok(content)
	}
}

/// Reads sources from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
	fn open(&self, path: &Path) -> io::Result<Box<dyn BufRead + '_>> {
		Ok(Box::new(BufReader::new(File::open(path)?)))
	}
}

/// Map each tag of `markers` to the first file (in `files` order) with a
/// line containing the tag's literal.
pub fn scan_for_markers(
	reader: &dyn SourceReader,
	files: &[PathBuf],
	markers: &[(&str, &str)],
) -> BTreeMap<String, PathBuf> {
	let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();

	for file in files {
		if found.len() == markers.len() {
			break;
		}

		let source = match reader.open(file) {
			Ok(source) => source,
			Err(e) => {
				tracing::warn!(path = %file.display(), error = %e, "skipping unreadable source file");
				continue;
			}
		};

		for line in source.lines() {
			let line = match line {
				Ok(line) => line,
				Err(e) => {
					tracing::warn!(path = %file.display(), error = %e, "stopped reading source file");
					break;
				}
			};

			for (tag, literal) in markers {
				if !found.contains_key(*tag) && line.contains(literal) {
					found.insert((*tag).to_string(), file.clone());
				}
			}
		}
	}

	found
}

/// Collect configuration properties declared in `files`.
///
/// Two shapes are recognized: a `private static final` field assigned from
/// `AgentInstrumentationConfig.get().getX("key", default)`, and a call to a
/// getter in `experimental` through `ExperimentalConfig.get().method()`.
/// Properties are deduplicated by name, keeping the first.
pub fn scan_for_config_properties(
	reader: &dyn SourceReader,
	files: &[PathBuf],
	experimental: &BTreeMap<String, ConfigurationProperty>,
) -> Vec<ConfigurationProperty> {
	let mut properties: Vec<ConfigurationProperty> = Vec::new();
	let mut push = |property: ConfigurationProperty| {
		if !properties.iter().any(|p| p.name == property.name) {
			properties.push(property);
		}
	};

	for file in files {
		let content = match reader.read_to_string(file) {
			Ok(content) => content,
			Err(e) => {
				tracing::warn!(path = %file.display(), error = %e, "skipping unreadable source file");
				continue;
			}
		};

		for property in parse_config_fields(&content) {
			push(property);
		}

		for (method, property) in experimental {
			if content.contains(&format!("{EXPERIMENTAL_CONFIG_ACCESSOR}{method}")) {
				push(property.clone());
			}
		}
	}

	properties
}

/// Properties declared as `private static final T NAME =
/// AgentInstrumentationConfig.get().getX("key", default);`. The declared
/// type is lower-cased.
pub fn parse_config_fields(content: &str) -> Vec<ConfigurationProperty> {
	CONFIG_FIELD
		.captures_iter(content)
		.filter_map(|caps| {
			Some(ConfigurationProperty::new(
				caps.get(3)?.as_str(),
				caps.get(1)?.as_str().to_lowercase(),
				Some(caps.get(4)?.as_str().trim().to_string()),
			))
		})
		.collect()
}

/// Build the side table of zero-argument getters, keyed by `method()`, whose
/// body reads a property through `config.getX("key"[, default])`.
pub fn extract_experimental_config_map(content: &str) -> BTreeMap<String, ConfigurationProperty> {
	CONFIG_GETTER
		.captures_iter(content)
		.filter_map(|caps| {
			let method = caps.get(1)?.as_str();
			let accessor = caps.get(2)?.as_str();
			let r#type = accessor.strip_prefix("get").unwrap_or(accessor);
			let default = caps.get(4).map(|m| m.as_str().trim().to_string());
			Some((
				format!("{method}()"),
				ConfigurationProperty::new(caps.get(3)?.as_str(), r#type, default),
			))
		})
		.collect()
}
