use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use metadoc_cli::Commands;
use metadoc_cli::ListFormat;
use metadoc_cli::MetadocCli;
use metadoc_cli::OutputFormat;
use metadoc_core::CheckResult;
use metadoc_core::DocsContext;
use metadoc_core::InstrumentationEntity;
use metadoc_core::MetadocConfig;
use metadoc_core::TargetFailure;
use metadoc_core::analyze_project;
use metadoc_core::check_docs;
use metadoc_core::compute_updates;
use metadoc_core::listing::Listing;
use metadoc_core::resolve_version;
use metadoc_core::write_updates;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MetadocCli::parse();

	// Respect NO_COLOR env var, --no-color flag, and non-terminal stderr.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::List { format, output }) => run_list(&args, *format, output.as_deref()),
		Some(Commands::Update {
			docs,
			version_label,
			dry_run,
		}) => run_update(&args, docs, version_label.as_deref(), *dry_run),
		Some(Commands::Check {
			docs,
			version_label,
			diff,
			format,
		}) => run_check(&args, docs, version_label.as_deref(), *diff, *format),
		None => {
			eprintln!("No subcommand specified. Run `metadoc --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<metadoc_core::MetadocError>() {
			Ok(metadoc_err) => {
				let report: miette::Report = (*metadoc_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr, filtered by `METADOC_LOG`. Without it the level is `warn`,
/// or `debug` with `--verbose`.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env("METADOC_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

fn resolve_root(args: &MetadocCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load the config and analyze every module under the source root.
fn analyze(
	args: &MetadocCli,
) -> Result<(PathBuf, MetadocConfig, Vec<InstrumentationEntity>), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = MetadocConfig::load_or_default(&root)?;
	let entities = analyze_project(&root, &config.scan)?;

	tracing::debug!(
		entities = entities.len(),
		root = %root.display(),
		config = ?MetadocConfig::resolve_path(&root),
		"analyzed source tree"
	);

	Ok((root, config, entities))
}

fn run_list(
	args: &MetadocCli,
	format: ListFormat,
	output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let (_, _, entities) = analyze(args)?;
	let listing = Listing::new(&entities);

	let mut text = match format {
		ListFormat::Yaml => listing.to_yaml()?,
		ListFormat::Json => listing.to_json()?,
	};
	if !text.ends_with('\n') {
		text.push('\n');
	}

	match output {
		Some(path) => {
			std::fs::write(path, &text)?;
			println!(
				"Wrote {} module(s) to {}",
				listing.len(),
				path.display()
			);
		}
		None => print!("{text}"),
	}

	Ok(())
}

fn run_update(
	args: &MetadocCli,
	docs_root: &Path,
	version_label: Option<&str>,
	dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let (root, config, entities) = analyze(args)?;
	let version = resolve_version(version_label, &config.docs, &root);
	let ctx = DocsContext::new(docs_root, &config.docs, &entities, version)?;
	let updates = compute_updates(&ctx);

	print_failures(&updates.failures, docs_root);
	if updates.all_failed() {
		eprintln!(
			"{} none of the {} documentation target(s) could be updated",
			colored!("error:", red),
			updates.target_count
		);
		process::exit(1);
	}

	if updates.updated_count == 0 {
		println!("All generated sections are already up to date.");
		return Ok(());
	}

	if dry_run {
		println!(
			"Dry run: would update {} section(s) in {} file(s):",
			updates.updated_count,
			updates.updated_files.len()
		);
		for path in updates.updated_files.keys() {
			println!("  {}", make_relative(path, docs_root));
		}
	} else {
		write_updates(&updates)?;
		println!(
			"Updated {} section(s) in {} file(s).",
			updates.updated_count,
			updates.updated_files.len()
		);

		if args.verbose {
			for path in updates.updated_files.keys() {
				println!("  {}", make_relative(path, docs_root));
			}
		}
	}

	Ok(())
}

fn run_check(
	args: &MetadocCli,
	docs_root: &Path,
	version_label: Option<&str>,
	show_diff: bool,
	format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
	let (root, config, entities) = analyze(args)?;
	let version = resolve_version(version_label, &config.docs, &root);
	let ctx = DocsContext::new(docs_root, &config.docs, &entities, version)?;
	let result = check_docs(&ctx);
	let passed = result.stale.is_empty() && !result.all_failed();

	match format {
		OutputFormat::Json => print_check_json(&result, docs_root, passed),
		OutputFormat::Text => print_check_text(&result, docs_root, show_diff),
	}

	if !passed {
		process::exit(1);
	}

	Ok(())
}

fn print_check_json(result: &CheckResult, docs_root: &Path, passed: bool) {
	let stale: Vec<serde_json::Value> = result
		.stale
		.iter()
		.map(|document| {
			serde_json::json!({
				"file": make_relative(&document.file, docs_root),
				"components": document.components,
			})
		})
		.collect();
	let failures: Vec<serde_json::Value> = result
		.failures
		.iter()
		.map(|failure| {
			serde_json::json!({
				"file": make_relative(&failure.file, docs_root),
				"component": failure.component,
				"message": failure.message,
			})
		})
		.collect();
	let output = serde_json::json!({
		"ok": passed,
		"stale": stale,
		"failures": failures,
	});
	println!("{output}");
}

fn print_check_text(result: &CheckResult, docs_root: &Path, show_diff: bool) {
	print_failures(&result.failures, docs_root);

	if result.all_failed() {
		eprintln!(
			"{} none of the {} documentation target(s) could be checked",
			colored!("error:", red),
			result.target_count
		);
		return;
	}

	if result.stale.is_empty() {
		println!("Check passed: all generated sections are up to date.");
		return;
	}

	eprintln!("Check failed.");
	eprintln!("  stale documents: {}", result.stale.len());
	eprintln!();
	eprintln!("Stale documents:");
	for document in &result.stale {
		eprintln!(
			"  {} ({})",
			make_relative(&document.file, docs_root),
			document.components.join(", ")
		);

		if show_diff {
			print_diff(&document.current_content, &document.expected_content);
		}
	}

	eprintln!();
	eprintln!(
		"{} document(s) are out of date. Run `metadoc update` to fix.",
		result.stale.len()
	);
}

fn print_failures(failures: &[TargetFailure], docs_root: &Path) {
	for failure in failures {
		eprintln!(
			"{} target `{}` in {}: {}",
			colored!("warning:", yellow),
			failure.component,
			make_relative(&failure.file, docs_root),
			failure.message
		);
	}
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
