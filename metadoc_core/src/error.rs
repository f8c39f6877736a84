use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MetadocError {
	#[error(transparent)]
	#[diagnostic(code(metadoc::io_error))]
	Io(#[from] std::io::Error),

	#[error("source root does not exist: `{path}`")]
	#[diagnostic(
		code(metadoc::root_not_found),
		help("pass the repository root with `--path` or run metadoc from inside it")
	)]
	RootNotFound { path: String },

	#[error("documentation directory does not exist: `{path}`")]
	#[diagnostic(
		code(metadoc::target_dir_not_found),
		help("check `--docs` and the `agent_dir` setting under [docs] in metadoc.toml")
	)]
	TargetDirNotFound { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(metadoc::config_parse),
		help("check that metadoc.toml is valid TOML with [scan] and/or [docs] sections")
	)]
	ConfigParse(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(metadoc::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("failed to parse metadata file `{path}`: {reason}")]
	#[diagnostic(
		code(metadoc::metadata_parse),
		help("metadata files are YAML documents with keys such as `description` and `display_name`")
	)]
	MetadataParse { path: String, reason: String },

	#[error("failed to serialize output: {0}")]
	#[diagnostic(code(metadoc::serialize))]
	Serialize(String),
}

pub type MetadocResult<T> = Result<T, MetadocError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
