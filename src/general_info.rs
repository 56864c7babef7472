//! General API metadata, read once from the `//!` docs of a root file.

use crate::annotation::{scan, Annotation, Tag};
use crate::error::{Error, Result};
use crate::model::ApiInfo;
use crate::parser::AstParser;
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralInfo {
    pub api_version: String,
    pub base_path: Option<String>,
    pub info: ApiInfo,
}

impl GeneralInfo {
    pub fn from_annotations(annotations: &[Annotation]) -> Self {
        let mut general = GeneralInfo::default();

        for annotation in annotations {
            let value = annotation.value.clone();
            match annotation.tag {
                Tag::ApiVersion => general.api_version = value,
                Tag::ApiTitle => general.info.title = value,
                Tag::ApiDescription => general.info.description = value,
                Tag::Contact => general.info.contact = Some(value),
                Tag::TermsOfServiceUrl => general.info.terms_of_service_url = Some(value),
                Tag::License => general.info.license = Some(value),
                Tag::LicenseUrl => general.info.license_url = Some(value),
                Tag::BasePath => general.base_path = Some(value),
                other => debug!("@{} has no meaning in the general info file", other.keyword()),
            }
        }

        general
    }

    /// Reads the general info from a single file.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let parsed = AstParser::parse_file(path, "")?;
        Ok(Self::from_annotations(&scan(&parsed.inner_doc())))
    }

    /// Tries `file` under each search root in order and returns the first that
    /// parses. If every root fails, the per-root failures are reported
    /// together.
    pub fn locate(search_roots: &[PathBuf], file: &Path) -> Result<Self> {
        let mut attempts = Vec::new();

        for root in search_roots {
            let candidate = root.join(file);
            if !candidate.is_file() {
                attempts.push(format!("    {}: file not found", candidate.display()));
                continue;
            }
            match Self::parse_file(&candidate) {
                Ok(general) => {
                    info!("Read general API info from {}", candidate.display());
                    return Ok(general);
                }
                Err(e) => attempts.push(format!("    {}: {}", candidate.display(), e)),
            }
        }

        Err(Error::GeneralInfoNotFound {
            file: file.to_path_buf(),
            attempts,
        })
    }
}
