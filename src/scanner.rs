use crate::error::{Result, Warning};
use indexmap::IndexMap;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for package directories.
///
/// A package is a directory; its source files are the `.rs` files directly
/// inside it. [`FileScanner::scan`] also reports every sub-directory as a
/// package of its own, skipping `target` and hidden directories. Files are
/// returned in file-name order so repeated runs see the same sequence.
///
/// # Example
///
/// ```no_run
/// use swagger_lite::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src/api"));
/// let result = scanner.scan("api").unwrap();
/// for package in &result.packages {
///     println!("{}: {} files", package.name, package.rust_files.len());
/// }
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// One package directory found while scanning.
#[derive(Debug, Clone)]
pub struct PackageDir {
    /// `/`-separated package name
    pub name: String,
    pub rust_files: Vec<PathBuf>,
}

/// Result of a scan.
pub struct ScanResult {
    /// The root package first, then sub-packages in traversal order
    pub packages: Vec<PackageDir>,
    /// Paths that could not be accessed; scanning continued past them
    pub warnings: Vec<Warning>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// The `.rs` files directly inside the root directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be read.
    pub fn package_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root_path)? {
            let path = entry?.path();
            if is_rust_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Walks the root directory and every sub-directory below it, naming
    /// each one relative to `base_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be read.
    pub fn scan(&self, base_name: &str) -> Result<ScanResult> {
        // Surface an unreadable root as a hard error rather than a warning.
        fs::read_dir(&self.root_path)?;

        let mut packages: IndexMap<PathBuf, PackageDir> = IndexMap::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_dir() {
                        packages.insert(
                            path.to_path_buf(),
                            PackageDir {
                                name: self.package_name(base_name, path),
                                rust_files: Vec::new(),
                            },
                        );
                    } else if is_rust_file(path) {
                        if let Some(package) = path.parent().and_then(|p| packages.get_mut(p)) {
                            package.rust_files.push(path.to_path_buf());
                        }
                    }
                }
                Err(e) => {
                    let warning = Warning::InaccessiblePath {
                        message: e.to_string(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            packages: packages.into_values().collect(),
            warnings,
        })
    }

    fn package_name(&self, base_name: &str, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.root_path).unwrap_or(dir);
        let mut segments: Vec<String> = Vec::new();
        if !base_name.is_empty() {
            segments.push(base_name.to_string());
        }
        segments.extend(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string()),
        );
        segments.join("/")
    }
}

fn is_rust_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs")
}
