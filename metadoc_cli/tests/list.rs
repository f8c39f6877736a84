mod common;

use clap::Parser;
use metadoc_cli::Commands;
use metadoc_cli::ListFormat;
use metadoc_cli::MetadocCli;
use metadoc_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use serde_json::Value;
use similar_asserts::assert_eq;

#[test]
fn list_prints_yaml_by_default() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());

	common::metadoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::starts_with("libraries:\n"))
		.stdout(predicates::str::contains("name: okhttp-3.0"))
		.stdout(predicates::str::contains("name: tomcat-10.0"));

	Ok(())
}

#[rstest]
#[case::yaml("yaml", "libraries:\n")]
#[case::json("json", "{\n  \"libraries\": {\n")]
fn list_format_selects_serializer(#[case] format: &str, #[case] prefix: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());

	common::metadoc_cmd()
		.arg("list")
		.arg("--format")
		.arg(format)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::starts_with(prefix));

	Ok(())
}

#[test]
fn list_json_groups_entities() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());

	let output = common::metadoc_cmd()
		.arg("list")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();

	let listing: Value = serde_json::from_slice(&output)?;
	let okhttp = &listing["libraries"]["okhttp"][0];
	assert_eq!(okhttp["name"], "okhttp-3.0");
	assert_eq!(okhttp["display_name"], "OkHttp");
	assert_eq!(okhttp["types"], serde_json::json!(["javaagent", "library"]));
	assert_eq!(
		okhttp["target_versions"]["library"],
		serde_json::json!(["com.squareup.okhttp3:okhttp:3.0.0"])
	);
	assert_eq!(okhttp["semantic_tags"], serde_json::json!(["http_client_attributes"]));
	assert_eq!(listing["libraries"]["tomcat"][0]["name"], "tomcat-10.0");

	Ok(())
}

#[test]
fn list_writes_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());
	let output = tmp.path().join("listing.yaml");

	common::metadoc_cmd()
		.arg("list")
		.arg("--output")
		.arg(&output)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote 2 module(s)"));

	let content = std::fs::read_to_string(&output)?;
	assert!(content.starts_with("libraries:\n"));
	assert!(content.contains("okhttp-3.0"));

	Ok(())
}

#[test]
fn list_is_deterministic() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());

	let run = || -> Result<Vec<u8>, Box<dyn std::error::Error>> {
		Ok(common::metadoc_cmd()
			.arg("list")
			.arg("--path")
			.arg(tmp.path())
			.assert()
			.success()
			.get_output()
			.stdout
			.clone())
	};

	assert_eq!(run()?, run()?);

	Ok(())
}

#[test]
fn list_missing_root_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::metadoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path().join("missing"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("source root does not exist"));

	Ok(())
}

#[test]
fn list_invalid_config_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());
	common::write_file(tmp.path(), "metadoc.toml", "[scan\n");

	common::metadoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("metadoc::config_parse"));

	Ok(())
}

#[test]
fn list_respects_config_exclude() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::create_source_tree(tmp.path());
	common::write_file(
		tmp.path(),
		".config/metadoc.toml",
		"[scan]\nexclude = [\"instrumentation/tomcat/\"]\n",
	);

	common::metadoc_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("okhttp-3.0"))
		.stdout(predicates::str::contains("tomcat").not());

	Ok(())
}

#[test]
fn list_flags_are_accepted_by_cli_parser() {
	let cli = MetadocCli::try_parse_from(["metadoc", "list", "--format", "json", "-o", "out.json"])
		.unwrap_or_else(|e| panic!("{e}"));

	match cli.command {
		Some(Commands::List { format, output }) => {
			assert!(matches!(format, ListFormat::Json));
			assert_eq!(output.as_deref(), Some(std::path::Path::new("out.json")));
		}
		_ => panic!("expected List command"),
	}
}
