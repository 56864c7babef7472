use crate::generator::{generate, GeneratorConfig};
use crate::serializer::{render_markdown, serialize_json, serialize_yaml, write_to_file};
use crate::type_resolver::TypeAliases;
use crate::walker::{AnyFunction, ControllerPredicate, PublicFunctions};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable holding a search-root path list when `--search-root`
/// is not given.
pub const SOURCE_PATH_ENV: &str = "API_SOURCE_PATH";

/// swagger-lite - Generate Swagger documentation from annotated Rust doc comments
#[derive(Parser, Debug)]
#[command(name = "swagger-lite")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Package holding the API controllers, e.g. `api` or `api/v1`
    #[arg(long = "api-package", value_name = "PKG")]
    pub api_package: String,

    /// File with the general API info, relative to a search root [default: <PKG>/mod.rs]
    #[arg(long = "main-api-file", value_name = "FILE")]
    pub main_api_file: Option<PathBuf>,

    /// Base path written to the listing; overrides @BasePath
    #[arg(long = "base-path", value_name = "PATH")]
    pub base_path: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Packages that may be missing without failing the run
    #[arg(long = "exclude", value_name = "PKG", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Directory to look for packages in; repeatable, tried in order
    #[arg(long = "search-root", value_name = "DIR")]
    pub search_roots: Vec<PathBuf>,

    /// Extra type alias, e.g. `Uuid=string`; repeatable
    #[arg(long = "alias", value_name = "NAME=PRIMITIVE", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,

    /// Only document `pub` functions
    #[arg(long = "public-only")]
    pub public_only: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Markdown tables
    Markdown,
}

fn parse_alias(value: &str) -> std::result::Result<(String, String), String> {
    let (name, primitive) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PRIMITIVE, got `{}`", value))?;
    let (name, primitive) = (name.trim(), primitive.trim());
    if name.is_empty() || primitive.is_empty() {
        return Err(format!("expected NAME=PRIMITIVE, got `{}`", value));
    }
    Ok((name.to_string(), primitive.to_string()))
}

/// Explicit roots win; otherwise the path list in `env_value`; otherwise the
/// current directory.
pub fn resolve_search_roots(explicit: &[PathBuf], env_value: Option<OsString>) -> Vec<PathBuf> {
    if !explicit.is_empty() {
        return explicit.to_vec();
    }
    let from_env: Vec<PathBuf> = env_value
        .map(|value| {
            env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();
    if from_env.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        from_env
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if args.api_package.trim_matches('/').is_empty() {
        anyhow::bail!("--api-package must name a package");
    }

    info!("API package: {}", args.api_package);
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

impl CliArgs {
    /// Builds the run configuration, reading the search-root environment
    /// variable when no root was given.
    pub fn to_config(&self) -> Result<GeneratorConfig> {
        let mut type_aliases = TypeAliases::default();
        for (name, primitive) in &self.aliases {
            type_aliases.insert(name, primitive)?;
        }

        let search_roots = resolve_search_roots(&self.search_roots, env::var_os(SOURCE_PATH_ENV));
        info!(
            "Search roots: {}",
            search_roots
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(GeneratorConfig {
            search_roots,
            api_package: self.api_package.clone(),
            main_api_file: self.main_api_file.clone(),
            base_path: self.base_path.clone(),
            package_exclusions: self.exclude.clone(),
            type_aliases,
        })
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting documentation generation...");
    let config = args.to_config()?;

    let predicate: &dyn ControllerPredicate = if args.public_only {
        &PublicFunctions
    } else {
        &AnyFunction
    };

    let generated = generate(&config, predicate).with_context(|| {
        format!(
            "failed to generate documentation for package `{}`",
            config.api_package
        )
    })?;
    let documentation = &generated.documentation;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Json => serialize_json(documentation)?,
        OutputFormat::Yaml => serialize_yaml(documentation)?,
        OutputFormat::Markdown => render_markdown(documentation),
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Resources: {}", documentation.api_declarations.len());
    info!(
        "  - Operations: {}",
        documentation
            .api_declarations
            .values()
            .map(|d| d.operations.len())
            .sum::<usize>()
    );
    info!("  - Warnings: {}", generated.warnings.len());

    Ok(())
}
