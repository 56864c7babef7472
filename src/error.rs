use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal conditions. Any of these stops the run and no document is produced.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error in {}: {message}", .file.display())]
    Parse { file: PathBuf, message: String },

    #[error("package `{package}` not found in any search root ({})", display_roots(.searched))]
    PackageNotFound {
        package: String,
        searched: Vec<PathBuf>,
    },

    #[error("cannot resolve type `{type_name}` referenced by `{declaration}`")]
    UnresolvedType {
        type_name: String,
        declaration: String,
    },

    #[error("error locating general API file `{}`:\n{}", .file.display(), .attempts.join("\n"))]
    GeneralInfoNotFound {
        file: PathBuf,
        attempts: Vec<String>,
    },

    #[error("alias `{alias}`: unknown primitive `{primitive}`")]
    UnknownPrimitive { alias: String, primitive: String },

    #[error("model `{model}` referenced by resource `{resource}` was never registered")]
    UnresolvedModel { model: String, resource: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

/// Recoverable conditions. They are logged and collected next to the output,
/// and never stop the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An annotation line whose value could not be interpreted.
    MalformedAnnotation {
        declaration: String,
        line: String,
        reason: String,
    },
    /// A package named in the exclusion list that does not exist.
    ExcludedPackageMissing { package: String },
    /// A second controller claiming a method and path already documented.
    DuplicateRoute {
        declaration: String,
        method: String,
        path: String,
    },
    /// A directory or file inside a package that could not be listed.
    InaccessiblePath { message: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MalformedAnnotation {
                declaration,
                line,
                reason,
            } => write!(
                f,
                "skipping malformed annotation in `{}`: {} ({})",
                declaration, line, reason
            ),
            Warning::ExcludedPackageMissing { package } => {
                write!(f, "excluded package `{}` not found, skipping", package)
            }
            Warning::DuplicateRoute {
                declaration,
                method,
                path,
            } => write!(
                f,
                "`{}` documents {} {} again, keeping the first declaration",
                declaration, method, path
            ),
            Warning::InaccessiblePath { message } => {
                write!(f, "failed to access path: {}", message)
            }
        }
    }
}
