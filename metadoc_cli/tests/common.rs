#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const SOURCE_ID: &str = "opentelemetry-java-instrumentation";
pub const AGENT_DIR: &str = "content/en/docs/zero-code/java/agent";

pub fn metadoc_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("metadoc"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("METADOC_LOG");
	cmd
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

/// An instrumentation tree with `okhttp-3.0` (agent and library) and
/// `tomcat-10.0` (agent).
pub fn create_source_tree(root: &Path) {
	write_file(root, "version.gradle.kts", "version = \"2.11.0\"\n");
	write_file(
		root,
		"instrumentation/okhttp/okhttp-3.0/javaagent/build.gradle.kts",
		"muzzle {\n  pass {\n    group.set(\"com.squareup.okhttp3\")\n    \
		 module.set(\"okhttp\")\n    versions.set(\"[3.0,)\")\n  }\n}\n",
	);
	write_file(
		root,
		"instrumentation/okhttp/okhttp-3.0/library/build.gradle.kts",
		"dependencies {\n  library(\"com.squareup.okhttp3:okhttp:3.0.0\")\n}\n",
	);
	write_file(
		root,
		"instrumentation/okhttp/okhttp-3.0/library/src/main/java/OkHttpAttributesGetter.java",
		"enum OkHttpAttributesGetter implements HttpClientAttributesGetter<Chain, Response> {}\n",
	);
	write_file(
		root,
		"instrumentation/okhttp/okhttp-3.0/metadata.yaml",
		"display_name: OkHttp\nsemantic_conventions:\n  - HTTP_CLIENT_SPANS\n",
	);
	write_file(
		root,
		"instrumentation/tomcat/tomcat-10.0/javaagent/build.gradle.kts",
		"muzzle {\n  pass {\n    group.set(\"org.apache.tomcat.embed\")\n    \
		 module.set(\"tomcat-embed-core\")\n    versions.set(\"[10.0.0,)\")\n  }\n}\n",
	);
}

pub fn marked_document(component: &str, body: &str) -> String {
	format!(
		"# Page\n\nHand-written introduction.\n\n<!-- BEGIN-GENERATED: COMPONENT:{component} \
		 SOURCE:{SOURCE_ID} -->\n{body}\n<!-- END-GENERATED: COMPONENT:{component} \
		 SOURCE:{SOURCE_ID} -->\n\nHand-written footer.\n"
	)
}

/// A documentation checkout with stale supported-libraries and disable-list
/// regions. Returns the agent directory.
pub fn create_docs_tree(root: &Path) -> PathBuf {
	let agent_dir = root.join(AGENT_DIR);
	write_file(
		&agent_dir,
		"supported-libraries.md",
		&marked_document("supported-libraries", "old table"),
	);
	write_file(&agent_dir, "disable.md", &marked_document("disable-list", "old list"));
	agent_dir
}
