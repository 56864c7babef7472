use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{AttrStyle, Attribute, Expr, Lit, Meta};

/// Parser for the Rust source files of a package.
///
/// # Example
///
/// ```no_run
/// use swagger_lite::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/api/mod.rs"), "api").unwrap();
/// println!("{} has {} items", parsed.module_path, parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A parsed source file together with where it sits in the module tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Package (directory, `/`-separated) the file was loaded as part of
    pub package: String,
    /// Module the file defines, `/`-separated; `mod.rs`, `lib.rs` and
    /// `main.rs` define their directory's module
    pub module_path: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Reads and parses a single file belonging to `package`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`]
    /// if it is not valid Rust.
    pub fn parse_file(path: &Path, package: &str) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)?;
        Self::parse_source(path, package, &content)
    }

    /// Parses already-loaded source text.
    pub fn parse_source(path: &Path, package: &str, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content).map_err(|e| Error::Parse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            package: package.to_string(),
            module_path: module_path_for(path, package),
            syntax_tree,
        })
    }
}

impl ParsedFile {
    /// The file's `//!` documentation.
    pub fn inner_doc(&self) -> String {
        doc_text(&self.syntax_tree.attrs, true)
    }
}

fn module_path_for(path: &Path, package: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    // A single-file package already names its own module.
    if package.rsplit('/').next() == Some(stem.as_str()) {
        return package.to_string();
    }
    match stem.as_str() {
        "mod" | "lib" | "main" => package.to_string(),
        _ if package.is_empty() => stem,
        _ => format!("{}/{}", package, stem),
    }
}

/// The `///` documentation attached to an item, one line per attribute.
pub fn outer_doc(attrs: &[Attribute]) -> String {
    doc_text(attrs, false)
}

fn doc_text(attrs: &[Attribute], inner: bool) -> String {
    let mut lines = Vec::new();

    for attr in attrs {
        if matches!(attr.style, AttrStyle::Inner(_)) != inner || !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(name_value) = &attr.meta {
            if let Expr::Lit(expr_lit) = &name_value.value {
                if let Lit::Str(text) = &expr_lit.lit {
                    lines.push(text.value());
                }
            }
        }
    }

    lines.join("\n")
}
