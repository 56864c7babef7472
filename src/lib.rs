//! swagger-lite - Swagger documentation from annotated Rust doc comments.
//!
//! Controllers describe themselves with `@`-tags in their doc comments. This
//! library walks an API package and every package it reaches, resolves the
//! Rust types those tags name into a shared model registry, and assembles a
//! Swagger 1.2 style resource listing plus one API declaration per resource.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Lists the source files of package directories
//! 2. [`parser`] - Parses Rust source files into ASTs and reads doc comments
//! 3. [`annotation`] - Scans doc comments into tags and parses tag values
//! 4. [`type_resolver`] - Maps Rust types onto type references and models
//! 5. [`registry`] - Holds every model discovered during a run
//! 6. [`walker`] - Loads reachable packages and builds operations from controllers
//! 7. [`general_info`] - Reads API-wide metadata from the root file
//! 8. [`aggregator`] - Groups operations into per-resource declarations
//! 9. [`generator`] - Runs the whole pipeline from a [`generator::GeneratorConfig`]
//! 10. [`serializer`] - Renders the result as JSON, YAML or markdown
//!
//! # Example Usage
//!
//! ```no_run
//! use swagger_lite::generator::{generate, GeneratorConfig};
//! use swagger_lite::serializer::serialize_json;
//! use swagger_lite::walker::PublicFunctions;
//! use std::path::PathBuf;
//!
//! let mut config = GeneratorConfig::new("api");
//! config.search_roots = vec![PathBuf::from("./src")];
//! config.package_exclusions = vec!["legacy".to_string()];
//!
//! let generated = generate(&config, &PublicFunctions).unwrap();
//! for warning in &generated.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! println!("{}", serialize_json(&generated.documentation).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod aggregator;
pub mod annotation;
pub mod cli;
pub mod error;
pub mod general_info;
pub mod generator;
pub mod model;
pub mod parser;
pub mod registry;
pub mod scanner;
pub mod serializer;
pub mod type_resolver;
pub mod walker;
