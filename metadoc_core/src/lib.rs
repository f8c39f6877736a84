//! `metadoc_core` extracts metadata about the modules of a large instrumentation repository by reading its build descriptors and sources, then publishes that metadata into hand-maintained documentation pages without disturbing the prose around it.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source tree
//!   -> Classifier (walks the tree, finds `<container>/.../<name>/<javaagent|library>` module paths)
//!   -> Descriptor resolver (target versions and minimum Java version from build.gradle.kts)
//!   -> Source scanner (configuration properties, semantic and span-kind markers)
//!   -> Analyzer (one entity per group/namespace/name, enriched with the above and metadata.yaml)
//!   -> Renderers (supported libraries, application servers, disable list)
//!   -> Marker updater (splices rendered text between BEGIN-GENERATED / END-GENERATED comments)
//! ```
//!
//! ## Modules
//!
//! - [`classifier`] - Module path classification and companion file discovery.
//! - [`descriptor`] - Dependency resolution over Gradle Kotlin build descriptors.
//! - [`source_scanner`] - Marker and configuration property extraction from sources.
//! - [`listing`] - The `libraries` YAML/JSON listing of every entity.
//! - [`render`] - Markdown fragments for the documentation site.
//! - [`config`] - Configuration loading from `metadoc.toml`.
//!
//! ## Key Types
//!
//! - [`InstrumentationEntity`] - One logical module merged across its module types.
//! - [`MarkerUpdater`] - Replaces the generated region of a document.
//! - [`DocsContext`] - Everything needed to check or update a documentation checkout.
//! - [`MetadocConfig`] - Configuration loaded from `metadoc.toml`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use metadoc_core::DocsContext;
//! use metadoc_core::MetadocConfig;
//! use metadoc_core::analyze_project;
//! use metadoc_core::compute_updates;
//! use metadoc_core::write_updates;
//!
//! let root = Path::new(".");
//! let config = MetadocConfig::load_or_default(root).unwrap();
//! let entities = analyze_project(root, &config.scan).unwrap();
//!
//! let ctx = DocsContext::new(Path::new("../docs"), &config.docs, &entities, "v2.11.0").unwrap();
//! let updates = compute_updates(&ctx);
//! write_updates(&updates).unwrap();
//! ```

pub use analyzer::*;
pub use config::*;
pub use engine::*;
pub use entity::*;
pub use error::*;
pub use markers::*;

mod analyzer;
pub mod classifier;
pub mod config;
pub mod descriptor;
mod engine;
mod entity;
#[allow(unused_assignments)]
mod error;
pub mod listing;
mod markers;
pub mod render;
pub mod source_scanner;

#[cfg(test)]
mod __fixtures;
