//! The end-to-end run: general info, package walk, aggregation.

use crate::aggregator::DeclarationAggregator;
use crate::error::{Result, Warning};
use crate::general_info::GeneralInfo;
use crate::model::Documentation;
use crate::type_resolver::TypeAliases;
use crate::walker::{ControllerPredicate, PackageWalker};
use log::info;
use std::path::PathBuf;

/// Everything one run needs. Built by the CLI or directly by library callers.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Roots tried in order when locating packages and the general info file
    pub search_roots: Vec<PathBuf>,
    /// `/`-separated package holding the controllers
    pub api_package: String,
    /// Root file carrying the general API info, relative to a search root.
    /// Defaults to `<api_package>/mod.rs`.
    pub main_api_file: Option<PathBuf>,
    /// Overrides any `@BasePath` from the general info file
    pub base_path: Option<String>,
    /// Packages that are tolerated when missing
    pub package_exclusions: Vec<String>,
    pub type_aliases: TypeAliases,
}

impl GeneratorConfig {
    pub fn new(api_package: impl Into<String>) -> Self {
        Self {
            search_roots: vec![PathBuf::from(".")],
            api_package: api_package.into(),
            main_api_file: None,
            base_path: None,
            package_exclusions: Vec::new(),
            type_aliases: TypeAliases::default(),
        }
    }

    pub fn main_api_file(&self) -> PathBuf {
        self.main_api_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.api_package).join("mod.rs"))
    }
}

/// A finished document plus the warnings raised while building it.
#[derive(Debug)]
pub struct Generated {
    pub documentation: Documentation,
    pub warnings: Vec<Warning>,
}

/// Runs the whole pipeline.
///
/// # Errors
///
/// Stops at the first fatal condition; no partial document is returned.
pub fn generate(config: &GeneratorConfig, predicate: &dyn ControllerPredicate) -> Result<Generated> {
    let general = GeneralInfo::locate(&config.search_roots, &config.main_api_file())?;

    let walk = PackageWalker::new(&config.search_roots, &config.package_exclusions, predicate)
        .walk(&config.api_package, &config.type_aliases)?;

    let base_path = config
        .base_path
        .clone()
        .or_else(|| general.base_path.clone())
        .unwrap_or_default();

    let mut aggregator = DeclarationAggregator::new(general, base_path);
    for discovered in walk.operations {
        aggregator.add(discovered);
    }
    let documentation = aggregator.build(&walk.registry)?;

    info!(
        "Generated {} resource declarations ({} warnings)",
        documentation.api_declarations.len(),
        walk.warnings.len()
    );

    Ok(Generated {
        documentation,
        warnings: walk.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::AnyFunction;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_main_api_file_defaults_to_package_mod() {
        let mut config = GeneratorConfig::new("api/v1");
        assert_eq!(config.main_api_file(), PathBuf::from("api/v1/mod.rs"));

        config.main_api_file = Some(PathBuf::from("main.rs"));
        assert_eq!(config.main_api_file(), PathBuf::from("main.rs"));
    }

    #[test]
    fn test_base_path_override() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("api")).unwrap();
        fs::write(
            temp_dir.path().join("api/mod.rs"),
            "//! @APIVersion 2.0\n//! @BasePath /from-file\n\n/// @Router /ping [get]\npub fn ping() {}\n",
        )
        .unwrap();

        let mut config = GeneratorConfig::new("api");
        config.search_roots = vec![temp_dir.path().to_path_buf()];

        let generated = generate(&config, &AnyFunction).unwrap();
        let listing = &generated.documentation.resource_listing;
        assert_eq!(listing.base_path, "/from-file");
        assert_eq!(listing.api_version, "2.0");

        config.base_path = Some("/override".to_string());
        let generated = generate(&config, &AnyFunction).unwrap();
        assert_eq!(generated.documentation.resource_listing.base_path, "/override");
        assert_eq!(
            generated.documentation.api_declarations["ping"].base_path,
            "/override"
        );
    }
}
