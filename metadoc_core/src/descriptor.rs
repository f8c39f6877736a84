use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::classifier::ModuleType;

/// Platform version assumed for `coreJdk()` passes when the descriptor does
/// not declare one.
pub const DEFAULT_MIN_JAVA_VERSION: u32 = 8;

macro_rules! pattern {
	($name:ident, $re:literal) => {
		static $name: LazyLock<Regex> =
			LazyLock::new(|| Regex::new($re).expect(concat!("invalid pattern: ", $re)));
	};
}

pattern!(VARIABLE, r#"\b(?:val|var)\s+(\w+)\s*=\s*"([^"]*)""#);
pattern!(MUZZLE_OPENER, r"\bmuzzle\s*\{");
pattern!(PASS_OPENER, r"\bpass\s*\{");
pattern!(CORE_JDK, r"\bcoreJdk\(\)");
pattern!(GROUP_SET, r#"\bgroup\.set\("([^"]+)"\)"#);
pattern!(MODULE_SET, r#"\bmodule\.set\("([^"]+)"\)"#);
pattern!(VERSIONS_SET, r#"\bversions\.set\("([^"]+)"\)"#);
pattern!(LIBRARY, r#"\blibrary\("([^"]+:[^"]+):([^"]+)"\)"#);
pattern!(TEST_LIBRARY, r#"\btestLibrary\("([^"]+:[^"]+):([^"]+)"\)"#);
pattern!(LATEST_DEP_TEST_LIBRARY, r#"\blatestDepTestLibrary\("([^"]+:[^"]+):([^"]+)"\)"#);
pattern!(COMPILE_ONLY, r#"\bcompileOnly\("([^"]+:[^"]+):([^"]+)"\)"#);
pattern!(STRICT_COMPILE_ONLY_OPENER, r#"\bcompileOnly\("([^":]+:[^":]+)(?::[^"]*)?"\)\s*\{"#);
pattern!(VERSION_OPENER, r"\bversion\s*\{");
pattern!(STRICTLY, r#"\bstrictly\("([^"]+)"\)"#);
pattern!(IF_OPENER, r"\bif\s*\(");
pattern!(TESTING_OPENER, r"\btesting\s*\{");
pattern!(OTEL_JAVA_OPENER, r"\botelJava\s*\{");
pattern!(MIN_JAVA_VERSION, r"\bminJavaVersionSupported\.set\(JavaVersion\.VERSION_(\d+)\)");

/// What one build descriptor says about supported dependency versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyInfo {
	/// `group:artifact:version-or-range` strings, or `Java N+` for passes
	/// against the core platform.
	pub versions: BTreeSet<String>,
	/// The minimum platform version declared in the `otelJava` block.
	pub min_java_version: Option<u32>,
}

/// Extract supported versions from a build descriptor.
///
/// Agent modules are resolved from their `muzzle { pass { .. } }` blocks.
/// Library modules are resolved from dependency declarations, preferring
/// `library(..)` over `compileOnly(..)` over filtered `testLibrary(..)`.
/// Unrecognized or partial declarations are ignored.
pub fn resolve(descriptor: &str, module_type: ModuleType) -> DependencyInfo {
	let exclusions = ExclusionRanges::compute(descriptor);
	let variables = extract_variables(descriptor);
	let min_java_version = min_java_version_outside(descriptor, &exclusions);

	let versions = match module_type {
		ModuleType::JavaAgent => resolve_muzzle(descriptor, &variables, min_java_version),
		ModuleType::Library => {
			resolve_library(descriptor, &exclusions)
				.into_iter()
				.map(|(coordinate, spec)| interpolate(&format!("{coordinate}:{spec}"), &variables))
				.collect()
		}
	};

	DependencyInfo {
		versions,
		min_java_version,
	}
}

/// A version constraint attached to one coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum VersionSpec {
	Pinned(String),
	/// Half-open `[lower,upper)`.
	Range { lower: String, upper: String },
}

impl VersionSpec {
	/// Replace the upper bound, turning a pinned version into a range that
	/// starts at it.
	fn widen(&mut self, upper: String) {
		let lower = match self {
			Self::Pinned(version) => std::mem::take(version),
			Self::Range { lower, .. } => std::mem::take(lower),
		};
		*self = Self::Range { lower, upper };
	}
}

impl fmt::Display for VersionSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pinned(version) => f.write_str(version),
			Self::Range { lower, upper } => write!(f, "[{lower},{upper})"),
		}
	}
}

fn resolve_muzzle(
	text: &str,
	variables: &[(String, String)],
	min_java_version: Option<u32>,
) -> BTreeSet<String> {
	let mut versions = BTreeSet::new();

	for muzzle in find_blocks(text, &MUZZLE_OPENER) {
		let body = &text[muzzle.body];
		for pass in find_blocks(body, &PASS_OPENER) {
			let pass_body = &body[pass.body];

			if CORE_JDK.is_match(pass_body) {
				let java = min_java_version.unwrap_or(DEFAULT_MIN_JAVA_VERSION);
				versions.insert(format!("Java {java}+"));
				continue;
			}

			let (Some(group), Some(module), Some(range)) = (
				first_capture(&GROUP_SET, pass_body),
				first_capture(&MODULE_SET, pass_body),
				first_capture(&VERSIONS_SET, pass_body),
			) else {
				continue;
			};

			versions.insert(format!("{group}:{module}:{}", interpolate(range, variables)));
		}
	}

	versions
}

fn resolve_library(text: &str, exclusions: &ExclusionRanges) -> BTreeMap<String, VersionSpec> {
	let mut versions: BTreeMap<String, VersionSpec> = library_declarations(text)
		.into_iter()
		.map(|(coordinate, version)| (coordinate, VersionSpec::Pinned(version)))
		.collect();

	if versions.is_empty() {
		versions = compile_only_declarations(text, exclusions)
			.into_iter()
			.map(|(coordinate, version)| (coordinate, VersionSpec::Pinned(version)))
			.collect();
		enrich_with_test_libraries(text, &mut versions);
	}

	if versions.is_empty() {
		for (coordinate, version) in test_library_declarations(text) {
			if !is_test_artifact(&coordinate) {
				versions
					.entry(coordinate)
					.or_insert(VersionSpec::Pinned(version));
			}
		}
	}

	for (coordinate, latest) in latest_dep_test_library_declarations(text) {
		if let Some(spec) = versions.get_mut(&coordinate) {
			spec.widen(latest);
		}
	}

	versions
}

/// Use a differing, bounded `testLibrary` version as the lower bound of a
/// compile-only coordinate.
fn enrich_with_test_libraries(text: &str, versions: &mut BTreeMap<String, VersionSpec>) {
	for (coordinate, test_version) in test_library_declarations(text) {
		let Some(spec) = versions.get_mut(&coordinate) else {
			continue;
		};
		let VersionSpec::Pinned(current) = spec else {
			continue;
		};
		if *current != test_version && !test_version.contains('+') {
			*spec = VersionSpec::Range {
				lower: test_version,
				upper: std::mem::take(current),
			};
		}
	}
}

/// `library("group:artifact:version")` calls; a repeated coordinate keeps
/// its last version.
pub fn library_declarations(text: &str) -> BTreeMap<String, String> {
	coordinate_calls(&LIBRARY, text)
		.map(|(_, coordinate, version)| (coordinate, version))
		.collect()
}

/// `testLibrary("group:artifact:version")` calls in source order.
pub fn test_library_declarations(text: &str) -> Vec<(String, String)> {
	coordinate_calls(&TEST_LIBRARY, text)
		.map(|(_, coordinate, version)| (coordinate, version))
		.collect()
}

/// `latestDepTestLibrary("group:artifact:version")` calls in source order.
pub fn latest_dep_test_library_declarations(text: &str) -> Vec<(String, String)> {
	coordinate_calls(&LATEST_DEP_TEST_LIBRARY, text)
		.map(|(_, coordinate, version)| (coordinate, version))
		.collect()
}

/// Compile-only coordinates outside any excluded range. A
/// `compileOnly("g:a") { version { strictly("v") } }` declaration wins over
/// a plain `compileOnly("g:a:v")` for the same coordinate.
pub fn compile_only_declarations(
	text: &str,
	exclusions: &ExclusionRanges,
) -> BTreeMap<String, String> {
	let mut versions = BTreeMap::new();

	for caps in STRICT_COMPILE_ONLY_OPENER.captures_iter(text) {
		let (Some(whole), Some(coordinate)) = (caps.get(0), caps.get(1)) else {
			continue;
		};
		if exclusions.contains(whole.start()) {
			continue;
		}
		let open = whole.end() - 1;
		let Some(close) = find_closing(text, open, b'{', b'}') else {
			continue;
		};
		let body = &text[open + 1..close];
		if !VERSION_OPENER.is_match(body) {
			continue;
		}
		if let Some(version) = first_capture(&STRICTLY, body) {
			versions.insert(coordinate.as_str().to_string(), version.to_string());
		}
	}

	for (start, coordinate, version) in coordinate_calls(&COMPILE_ONLY, text) {
		if !exclusions.contains(start) {
			versions.entry(coordinate).or_insert(version);
		}
	}

	versions
}

/// Whether a `group:artifact` names a test-only artifact.
pub fn is_test_artifact(coordinate: &str) -> bool {
	let lower = coordinate.to_lowercase();
	lower.ends_with("-test")
		|| lower.ends_with("-testing")
		|| lower.contains("starter-test")
		|| lower.contains(":junit")
		|| lower.contains(":mockito")
		|| lower.contains("test-support")
}

/// The `minJavaVersionSupported` value from the first `otelJava` block that
/// is not nested in an `if` or `testing` block.
pub fn parse_min_java_version(text: &str) -> Option<u32> {
	min_java_version_outside(text, &ExclusionRanges::compute(text))
}

fn min_java_version_outside(text: &str, exclusions: &ExclusionRanges) -> Option<u32> {
	find_blocks(text, &OTEL_JAVA_OPENER)
		.into_iter()
		.filter(|block| !exclusions.contains(block.start))
		.find_map(|block| first_capture(&MIN_JAVA_VERSION, &text[block.body])?.parse().ok())
}

/// String variables declared with `val name = "value"`, longest name first
/// so that interpolation never replaces a prefix of a longer name.
pub fn extract_variables(text: &str) -> Vec<(String, String)> {
	let declared: BTreeMap<&str, &str> = VARIABLE
		.captures_iter(text)
		.filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
		.collect();

	let mut variables: Vec<(String, String)> = declared
		.into_iter()
		.map(|(name, value)| (name.to_string(), value.to_string()))
		.collect();
	variables.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
	variables
}

/// Substitute `${name}` and `$name` references.
pub fn interpolate(text: &str, variables: &[(String, String)]) -> String {
	if !text.contains('$') {
		return text.to_string();
	}

	let mut result = text.to_string();
	for (name, value) in variables {
		result = result
			.replace(&format!("${{{name}}}"), value)
			.replace(&format!("${name}"), value);
	}
	result
}

/// Byte ranges of `if (..) { .. }` and `testing { .. }` blocks. Declarations
/// starting inside any of them are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRanges(Vec<Range<usize>>);

impl ExclusionRanges {
	pub fn compute(text: &str) -> Self {
		let mut ranges = Vec::new();

		for opener in IF_OPENER.find_iter(text) {
			let open_paren = opener.end() - 1;
			let Some(close_paren) = find_closing(text, open_paren, b'(', b')') else {
				continue;
			};
			let rest = &text[close_paren + 1..];
			let trimmed = rest.trim_start();
			if !trimmed.starts_with('{') {
				continue;
			}
			let open_brace = close_paren + 1 + (rest.len() - trimmed.len());
			if let Some(close_brace) = find_closing(text, open_brace, b'{', b'}') {
				ranges.push(opener.start()..close_brace + 1);
			}
		}

		ranges.extend(
			find_blocks(text, &TESTING_OPENER)
				.into_iter()
				.map(|block| block.start..block.end),
		);

		Self(ranges)
	}

	pub fn contains(&self, offset: usize) -> bool {
		self.0.iter().any(|range| range.contains(&offset))
	}

	pub fn ranges(&self) -> &[Range<usize>] {
		&self.0
	}
}

/// A `keyword { .. }` block located by byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
	/// Offset of the keyword.
	start: usize,
	/// Text between the braces.
	body: Range<usize>,
	/// Offset just past the closing brace.
	end: usize,
}

/// Every block whose opener (ending in `{`) matches `opener`. Openers
/// without a matching closing brace are skipped.
fn find_blocks(text: &str, opener: &Regex) -> Vec<Block> {
	opener
		.find_iter(text)
		.filter_map(|m| {
			let open = m.end() - 1;
			let close = find_closing(text, open, b'{', b'}')?;
			Some(Block {
				start: m.start(),
				body: open + 1..close,
				end: close + 1,
			})
		})
		.collect()
}

/// Offset of the delimiter that balances the one at `open`. Delimiters
/// inside double-quoted strings and `//` or `/* */` comments are ignored.
fn find_closing(text: &str, open: usize, open_byte: u8, close_byte: u8) -> Option<usize> {
	let bytes = text.as_bytes();
	let mut depth = 0usize;
	let mut in_string = false;
	let mut index = open;

	while index < bytes.len() {
		let byte = bytes[index];
		if in_string {
			match byte {
				b'\\' => index += 1,
				b'"' => in_string = false,
				_ => {}
			}
		} else if byte == b'"' {
			in_string = true;
		} else if bytes[index..].starts_with(b"//") {
			index = bytes[index..]
				.iter()
				.position(|b| *b == b'\n')
				.map_or(bytes.len(), |end| index + end);
			continue;
		} else if bytes[index..].starts_with(b"/*") {
			index = bytes[index + 2..]
				.windows(2)
				.position(|pair| pair == b"*/")
				.map_or(bytes.len(), |end| index + 2 + end + 2);
			continue;
		} else if byte == open_byte {
			depth += 1;
		} else if byte == close_byte {
			depth = depth.checked_sub(1)?;
			if depth == 0 {
				return Some(index);
			}
		}
		index += 1;
	}

	None
}

/// `(offset, group:artifact, version)` for each call matched by `pattern`.
fn coordinate_calls<'a>(
	pattern: &'a Regex,
	text: &'a str,
) -> impl Iterator<Item = (usize, String, String)> + 'a {
	pattern.captures_iter(text).filter_map(|caps| {
		Some((
			caps.get(0)?.start(),
			caps.get(1)?.as_str().to_string(),
			caps.get(2)?.as_str().to_string(),
		))
	})
}

fn first_capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
	pattern
		.captures(text)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
}
