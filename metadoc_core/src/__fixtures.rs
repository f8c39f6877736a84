use std::path::Path;

use tempfile::TempDir;

pub const OKHTTP_AGENT_DESCRIPTOR: &str = r#"plugins {
  id("otel.javaagent-instrumentation")
}

muzzle {
  pass {
    group.set("com.squareup.okhttp3")
    module.set("okhttp")
    versions.set("[3.0,)")
    assertInverse.set(true)
  }
}

dependencies {
  implementation(project(":instrumentation:okhttp:okhttp-3.0:library"))
  library("com.squareup.okhttp3:okhttp:3.0.0")
}
"#;

pub const OKHTTP_LIBRARY_DESCRIPTOR: &str = r#"plugins {
  id("otel.library-instrumentation")
}

dependencies {
  library("com.squareup.okhttp3:okhttp:3.0.0")
  latestDepTestLibrary("com.squareup.okhttp3:okhttp:4.+")
}
"#;

pub const OKHTTP_INSTRUMENTATION_SOURCE: &str = r#"package io.opentelemetry.javaagent.instrumentation.okhttp.v3_0;

public final class OkHttp3Singletons {

  private static final boolean CAPTURE_EXPERIMENTAL_SPAN_ATTRIBUTES =
      AgentInstrumentationConfig.get()
          .getBoolean("otel.instrumentation.okhttp.experimental-span-attributes", false);

  private static final Instrumenter<Request, Response> INSTRUMENTER =
      JavaagentHttpClientInstrumenters.create(
          "io.opentelemetry.okhttp-3.0", new OkHttpAttributesGetter());
}
"#;

pub const OKHTTP_ATTRIBUTES_SOURCE: &str = r"package io.opentelemetry.instrumentation.okhttp.v3_0.internal;

public enum OkHttpAttributesGetter implements HttpClientAttributesGetter<Interceptor.Chain, Response> {
  INSTANCE;
}
";

pub const OKHTTP_METADATA: &str = r"description: Instruments the OkHttp HTTP client.
display_name: OkHttp
library_link: https://square.github.io/okhttp/
semantic_conventions:
  - HTTP_CLIENT_SPANS
  - HTTP_CLIENT_METRICS
configurations:
  - name: otel.instrumentation.okhttp.experimental-span-attributes
    description: Enables experimental span attributes.
    type: boolean
    default: false
";

pub const TOMCAT_AGENT_DESCRIPTOR: &str = r#"muzzle {
  pass {
    group.set("org.apache.tomcat.embed")
    module.set("tomcat-embed-core")
    versions.set("[10.0.0,)")
  }
}
"#;

pub const EXECUTORS_AGENT_DESCRIPTOR: &str = r#"muzzle {
  pass {
    coreJdk()
  }
}

otelJava {
  minJavaVersionSupported.set(JavaVersion.VERSION_11)
}
"#;

pub const EXECUTORS_SOURCE: &str = r"package io.opentelemetry.javaagent.instrumentation.executors;

public class ExecutorAdviceHelper {
  static boolean enabled() {
    return ExperimentalConfig.get().indyEnabled();
  }
}
";

pub const EXPERIMENTAL_CONFIG_SOURCE: &str = r#"public final class ExperimentalConfig {

  private final InstrumentationConfig config;

  public boolean controllerTelemetryEnabled() {
    return config.getBoolean(
        "otel.instrumentation.common.experimental.controller-telemetry.enabled", false);
  }

  public boolean indyEnabled() {
    return config.getBoolean("otel.javaagent.experimental.indy", false);
  }
}
"#;

pub const EXPERIMENTAL_CONFIG_PATH: &str =
	"instrumentation-api-incubator/src/main/java/ExperimentalConfig.java";

/// Write `content` to `relative` below `root`, creating parent
/// directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

pub fn create_dir(root: &Path, relative: &str) {
	let path = root.join(relative);
	std::fs::create_dir_all(&path).unwrap_or_else(|e| panic!("create {}: {e}", path.display()));
}

/// A small instrumentation repository:
///
/// - `okhttp-3.0` with agent and library modules, sources, metadata, and
///   telemetry files
/// - `tomcat-10.0` with an agent module
/// - `executors` with a `coreJdk()` agent module using the experimental
///   config
/// - scaffolding that must never be classified (`okhttp-common`,
///   `executors/testing`, a `bootstrap` source tree)
pub fn create_instrumentation_repo() -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let root = tmp.path();

	write_file(root, "version.gradle.kts", "val stableVersion = \"2.11.0\"\nversion = \"2.11.0\"\n");

	let okhttp = "instrumentation/okhttp/okhttp-3.0";
	write_file(root, &format!("{okhttp}/javaagent/build.gradle.kts"), OKHTTP_AGENT_DESCRIPTOR);
	write_file(
		root,
		&format!("{okhttp}/javaagent/src/main/java/okhttp/OkHttp3Singletons.java"),
		OKHTTP_INSTRUMENTATION_SOURCE,
	);
	write_file(
		root,
		&format!("{okhttp}/javaagent/src/test/java/okhttp/OkHttpTest.java"),
		"class OkHttpTest { DbClientSpanNameExtractor unused; }\n",
	);
	write_file(root, &format!("{okhttp}/library/build.gradle.kts"), OKHTTP_LIBRARY_DESCRIPTOR);
	write_file(
		root,
		&format!("{okhttp}/library/src/main/java/okhttp/OkHttpAttributesGetter.java"),
		OKHTTP_ATTRIBUTES_SOURCE,
	);
	write_file(root, &format!("{okhttp}/metadata.yaml"), OKHTTP_METADATA);
	write_file(root, &format!("{okhttp}/.telemetry/scope.yaml"), "scope: {}\n");
	write_file(root, &format!("{okhttp}/.telemetry/metrics-default.yaml"), "metrics: []\n");
	write_file(root, &format!("{okhttp}/.telemetry/spans-default.yaml"), "spans: []\n");
	write_file(
		root,
		"instrumentation/okhttp/okhttp-common/library/build.gradle.kts",
		"dependencies {\n  library(\"com.squareup.okhttp3:okhttp:3.0.0\")\n}\n",
	);

	write_file(
		root,
		"instrumentation/tomcat/tomcat-10.0/javaagent/build.gradle.kts",
		TOMCAT_AGENT_DESCRIPTOR,
	);

	write_file(
		root,
		"instrumentation/executors/javaagent/build.gradle.kts",
		EXECUTORS_AGENT_DESCRIPTOR,
	);
	write_file(
		root,
		"instrumentation/executors/javaagent/src/main/java/ExecutorAdviceHelper.java",
		EXECUTORS_SOURCE,
	);
	create_dir(root, "instrumentation/executors/testing/javaagent");
	create_dir(root, "instrumentation/executors/bootstrap/src/main/javaagent");

	write_file(root, EXPERIMENTAL_CONFIG_PATH, EXPERIMENTAL_CONFIG_SOURCE);

	tmp
}

/// A documentation page with one generated region and prose around it.
pub fn marked_document(component: &str, source: &str, body: &str) -> String {
	format!(
		"# Title\n\nManual introduction.\n\n<!-- BEGIN-GENERATED: COMPONENT:{component} \
		 SOURCE:{source} -->\n{body}\n<!-- END-GENERATED: COMPONENT:{component} SOURCE:{source} \
		 -->\n\nManual footer.\n"
	)
}
