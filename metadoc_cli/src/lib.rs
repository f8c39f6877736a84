use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Extract module metadata from an instrumentation repository and keep generated \
	         documentation sections in sync.",
	long_about = "metadoc walks an instrumentation source tree, reads every module's build \
	              descriptor and sources, and publishes what it finds into hand-maintained \
	              documentation pages.\n\nOnly the text between BEGIN-GENERATED and \
	              END-GENERATED comments is ever rewritten.\n\nQuick start:\n  metadoc list    \
	              Print the libraries listing\n  metadoc update  Rewrite generated \
	              sections\n  metadoc check   Verify generated sections are up to date"
)]
pub struct MetadocCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the instrumentation source root.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output and debug logging.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Print every discovered module grouped by library.
	///
	/// The document has a single `libraries` key mapping each group to its
	/// modules, ordered by name. Output is deterministic for a given source
	/// tree.
	List {
		/// Output format for the listing.
		#[arg(long, value_enum, default_value_t = ListFormat::Yaml)]
		format: ListFormat,

		/// Write the listing to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Rewrite the generated sections of the documentation pages.
	///
	/// Renders every configured target and replaces the content between its
	/// marker pair. Text outside the markers is preserved byte for byte and
	/// documents without changes are not written.
	Update {
		/// Root of the documentation checkout.
		#[arg(long)]
		docs: PathBuf,

		/// Version label for the generated footer. Defaults to the `[docs]`
		/// config value, then to the version declared in
		/// `version.gradle.kts`.
		#[arg(long = "version", value_name = "VERSION")]
		version_label: Option<String>,

		/// Report which documents would change without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that the generated sections are up to date.
	///
	/// Exits with a non-zero status code when any section would change, which
	/// makes it suitable for CI.
	Check {
		/// Root of the documentation checkout.
		#[arg(long)]
		docs: PathBuf,

		/// Version label for the generated footer.
		#[arg(long = "version", value_name = "VERSION")]
		version_label: Option<String>,

		/// Show a unified diff for each stale document.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
	/// YAML document.
	Yaml,
	/// Pretty-printed JSON document.
	Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each stale entry includes
	/// the document path and the components that would change.
	Json,
}
