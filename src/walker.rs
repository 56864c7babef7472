//! Package walking.
//!
//! The walker loads the API package, its sub-directories and every package
//! reachable from them, indexes their type definitions, and turns each
//! annotated controller into an [`Operation`]. Loading happens breadth-first
//! in discovery order, and files are visited in file-name order, so the same
//! tree always yields the same operation sequence.

use crate::annotation::{self, scan, Annotation, BodyKind, Tag};
use crate::error::{Error, Result, Warning};
use crate::model::{Operation, Parameter, ResponseMessage, TypeRef};
use crate::parser::{outer_doc, AstParser, ParsedFile};
use crate::registry::ModelRegistry;
use crate::scanner::FileScanner;
use crate::type_resolver::{TypeAliases, TypeIndex, TypeResolver};
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use syn::visit::{self, Visit};

/// Decides which functions are controllers. Only controllers have their doc
/// comments scanned.
///
/// Any `Fn(&FunctionDecl) -> bool` closure is a predicate.
pub trait ControllerPredicate {
    fn is_controller(&self, declaration: &FunctionDecl<'_>) -> bool;
}

impl<F> ControllerPredicate for F
where
    F: Fn(&FunctionDecl<'_>) -> bool,
{
    fn is_controller(&self, declaration: &FunctionDecl<'_>) -> bool {
        self(declaration)
    }
}

/// Accepts every function.
pub struct AnyFunction;

impl ControllerPredicate for AnyFunction {
    fn is_controller(&self, _declaration: &FunctionDecl<'_>) -> bool {
        true
    }
}

/// Accepts only `pub` functions.
pub struct PublicFunctions;

impl ControllerPredicate for PublicFunctions {
    fn is_controller(&self, declaration: &FunctionDecl<'_>) -> bool {
        matches!(declaration.vis, syn::Visibility::Public(_))
    }
}

/// A function as seen by the controller predicate.
#[derive(Debug, Clone)]
pub struct FunctionDecl<'a> {
    /// `name`, or `Type::name` for associated functions
    pub name: String,
    pub sig: &'a syn::Signature,
    pub attrs: &'a [syn::Attribute],
    pub vis: &'a syn::Visibility,
    /// The implementing type for associated functions
    pub self_ty: Option<String>,
    pub file: &'a Path,
}

/// A loaded package and its parsed files.
#[derive(Debug)]
pub struct Package {
    pub name: String,
    pub files: Vec<ParsedFile>,
}

/// An operation plus the grouping hints its controller gave.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredOperation {
    /// Forced resource name from `@Resource`
    pub resource: Option<String>,
    pub resource_description: Option<String>,
    pub operation: Operation,
}

/// Everything the walk produced.
#[derive(Debug)]
pub struct WalkOutput {
    /// Package names in load order
    pub packages: Vec<String>,
    /// Operations in discovery order
    pub operations: Vec<DiscoveredOperation>,
    pub registry: ModelRegistry,
    pub warnings: Vec<Warning>,
}

/// Where a package lives. A module can have a `<name>.rs` file, a `<name>/`
/// directory, or both.
struct Location {
    dir: Option<PathBuf>,
    module_file: Option<PathBuf>,
}

pub struct PackageWalker<'a> {
    search_roots: &'a [PathBuf],
    exclusions: Vec<String>,
    predicate: &'a dyn ControllerPredicate,
    warnings: Vec<Warning>,
}

impl<'a> PackageWalker<'a> {
    pub fn new(
        search_roots: &'a [PathBuf],
        exclusions: &[String],
        predicate: &'a dyn ControllerPredicate,
    ) -> Self {
        Self {
            search_roots,
            exclusions: exclusions
                .iter()
                .map(|e| normalize_package(e))
                .filter(|e| !e.is_empty())
                .collect(),
            predicate,
            warnings: Vec::new(),
        }
    }

    /// Loads the packages, then documents every controller in them.
    ///
    /// # Errors
    ///
    /// Fails on the first missing non-excluded package, unparseable source
    /// file or unresolvable type.
    pub fn walk(mut self, api_package: &str, aliases: &TypeAliases) -> Result<WalkOutput> {
        let packages = self.load_packages(api_package)?;
        let index = TypeIndex::build(packages.iter().flat_map(|p| p.files.iter()));
        let mut resolver = TypeResolver::new(&index, aliases);

        let mut operations: Vec<DiscoveredOperation> = Vec::new();
        let mut routes = HashSet::new();

        for package in &packages {
            for file in &package.files {
                for declaration in collect_functions(file) {
                    if !self.predicate.is_controller(&declaration) {
                        continue;
                    }
                    let Some(discovered) = self.build_operation(&declaration, &mut resolver)? else {
                        continue;
                    };
                    let operation = &discovered.operation;
                    if !routes.insert((operation.method, operation.path.clone())) {
                        self.warn(Warning::DuplicateRoute {
                            declaration: declaration.name.clone(),
                            method: operation.method.to_string(),
                            path: operation.path.clone(),
                        });
                        continue;
                    }
                    debug!(
                        "Documented {} {} from {}",
                        operation.method, operation.path, declaration.name
                    );
                    operations.push(discovered);
                }
            }
        }

        info!(
            "Found {} operations and {} models",
            operations.len(),
            resolver.registry().len()
        );

        Ok(WalkOutput {
            packages: packages.into_iter().map(|p| p.name).collect(),
            operations,
            registry: resolver.into_registry(),
            warnings: self.warnings,
        })
    }

    /// Loads the API package (recursively) and every package reachable from
    /// it, breadth-first.
    pub fn load_packages(&mut self, api_package: &str) -> Result<Vec<Package>> {
        let api_package = normalize_package(api_package);
        let mut queue = VecDeque::from([api_package.clone()]);
        let mut seen: HashSet<String> = HashSet::from([api_package.clone()]);
        let mut loaded_files: HashSet<PathBuf> = HashSet::new();
        let mut inline_modules: HashSet<String> = HashSet::new();
        let mut deferred: HashSet<String> = HashSet::new();
        let mut packages = Vec::new();

        while let Some(name) = queue.pop_front() {
            if inline_modules.contains(&name) {
                debug!("`{}` is an inline module of a loaded file", name);
                continue;
            }
            let Some(location) = self.locate(&name) else {
                // The module may be declared inline in an ancestor that has
                // not been loaded yet; retry once after the ancestors.
                if deferred.insert(name.clone()) {
                    let mut waiting = false;
                    for ancestor in ancestors(&name) {
                        if queue.contains(&ancestor) {
                            waiting = true;
                        } else if !seen.contains(&ancestor) && self.locate(&ancestor).is_some() {
                            seen.insert(ancestor.clone());
                            queue.push_back(ancestor);
                            waiting = true;
                        }
                    }
                    if waiting {
                        debug!("Deferring `{}` until its ancestors are loaded", name);
                        queue.push_back(name);
                        continue;
                    }
                }
                if self.exclusions.contains(&name) {
                    self.warn(Warning::ExcludedPackageMissing { package: name });
                    continue;
                }
                return Err(Error::PackageNotFound {
                    package: name,
                    searched: self.search_roots.to_vec(),
                });
            };

            let mut members: Vec<(String, Vec<PathBuf>)> = match location.dir {
                Some(dir) if name == api_package => {
                    let scan_result = FileScanner::new(dir).scan(&name)?;
                    for warning in scan_result.warnings {
                        self.warnings.push(warning);
                    }
                    scan_result
                        .packages
                        .into_iter()
                        .map(|p| (p.name, p.rust_files))
                        .collect()
                }
                Some(dir) => vec![(name.clone(), FileScanner::new(dir).package_files()?)],
                None => Vec::new(),
            };
            if let Some(module_file) = location.module_file {
                match members.iter_mut().find(|(member, _)| *member == name) {
                    Some((_, files)) => files.insert(0, module_file),
                    None => members.insert(0, (name.clone(), vec![module_file])),
                }
            }
            for (member, _) in &members {
                seen.insert(member.clone());
            }

            for (member, files) in members {
                debug!("Loading package `{}` ({} files)", member, files.len());
                let mut parsed_files = Vec::new();
                for path in files {
                    let key = path.canonicalize().unwrap_or_else(|_| path.clone());
                    if !loaded_files.insert(key) {
                        continue;
                    }
                    let parsed = AstParser::parse_file(&path, &member)?;
                    let references = module_references(&parsed);
                    inline_modules.extend(references.inline_modules);
                    for reference in references.packages {
                        if seen.insert(reference.clone()) {
                            debug!("`{}` reaches package `{}`", member, reference);
                            queue.push_back(reference);
                        }
                    }
                    parsed_files.push(parsed);
                }
                packages.push(Package {
                    name: member,
                    files: parsed_files,
                });
            }
        }

        info!("Loaded {} packages", packages.len());
        Ok(packages)
    }

    fn locate(&self, package: &str) -> Option<Location> {
        for root in self.search_roots {
            if package.is_empty() {
                if root.is_dir() {
                    return Some(Location {
                        dir: Some(root.clone()),
                        module_file: None,
                    });
                }
                continue;
            }
            let dir = root.join(package);
            let file = root.join(format!("{}.rs", package));
            let location = Location {
                dir: dir.is_dir().then_some(dir),
                module_file: file.is_file().then_some(file),
            };
            if location.dir.is_some() || location.module_file.is_some() {
                return Some(location);
            }
        }
        None
    }

    /// Builds the operation for one controller. Returns `None` when its doc
    /// comment carries no usable `@Router`.
    fn build_operation(
        &mut self,
        declaration: &FunctionDecl<'_>,
        resolver: &mut TypeResolver<'_>,
    ) -> Result<Option<DiscoveredOperation>> {
        let annotations = scan(&outer_doc(declaration.attrs));

        let mut route = None;
        for annotation in annotations.iter().filter(|a| a.tag == Tag::Router) {
            match annotation::parse_route(&annotation.value) {
                Ok(parsed) if route.is_none() => route = Some(parsed),
                Ok(_) => self.malformed(declaration, annotation, "second @Router ignored"),
                Err(reason) => self.malformed(declaration, annotation, &reason),
            }
        }
        let Some(route) = route else {
            debug!("{} has no route, skipping", declaration.name);
            return Ok(None);
        };

        let mut operation = Operation::new(route.method, route.path, declaration.name.clone());
        let mut resource = None;
        let mut resource_description = None;
        let mut notes: Vec<String> = Vec::new();

        for annotation in &annotations {
            match annotation.tag {
                Tag::Router => {}
                Tag::Title if annotation.value.is_empty() => {
                    self.malformed(declaration, annotation, "empty title")
                }
                Tag::Title => operation.summary = Some(annotation.value.clone()),
                Tag::Description => notes.push(annotation.value.clone()),
                Tag::Resource => match annotation::parse_resource(&annotation.value) {
                    Ok((name, description)) => {
                        resource = Some(name);
                        resource_description = description;
                    }
                    Err(reason) => self.malformed(declaration, annotation, &reason),
                },
                Tag::Param => {
                    let spec = match annotation::parse_param(&annotation.value) {
                        Ok(spec) => spec,
                        Err(reason) => {
                            self.malformed(declaration, annotation, &reason);
                            continue;
                        }
                    };
                    let Some(ty) = self.parse_type(declaration, annotation, &spec.type_expr) else {
                        continue;
                    };
                    operation.parameters.push(Parameter {
                        name: spec.name,
                        location: spec.location,
                        type_ref: resolver.resolve(&ty, &declaration.name)?,
                        required: spec.required,
                        description: spec.description,
                    });
                }
                Tag::Success | Tag::Failure => {
                    let spec = match annotation::parse_response(&annotation.value) {
                        Ok(spec) => spec,
                        Err(reason) => {
                            self.malformed(declaration, annotation, &reason);
                            continue;
                        }
                    };
                    let response_model = match &spec.body {
                        Some((kind, type_expr)) => {
                            let Some(ty) = self.parse_type(declaration, annotation, type_expr) else {
                                continue;
                            };
                            let resolved = resolver.resolve(&ty, &declaration.name)?;
                            Some(match kind {
                                BodyKind::Object => resolved,
                                BodyKind::Array => TypeRef::array(resolved),
                            })
                        }
                        None => None,
                    };
                    if annotation.tag == Tag::Success
                        && (200..300).contains(&spec.code)
                        && operation.response_type.is_none()
                    {
                        operation.response_type = response_model.clone();
                    }
                    operation.response_messages.push(ResponseMessage {
                        code: spec.code,
                        message: spec
                            .description
                            .unwrap_or_else(|| reason_phrase(spec.code).to_string()),
                        response_model,
                    });
                }
                Tag::Accept | Tag::Produce => {
                    let mime_types = annotation::parse_mime_types(&annotation.value);
                    if mime_types.is_empty() {
                        self.malformed(declaration, annotation, "expected at least one MIME type");
                        continue;
                    }
                    for mime in mime_types {
                        if annotation.tag == Tag::Accept {
                            push_unique(&mut operation.consumes, &mime);
                        }
                        push_unique(&mut operation.produces, &mime);
                    }
                }
                other => debug!(
                    "@{} has no meaning on controller {}",
                    other.keyword(),
                    declaration.name
                ),
            }
        }

        if !notes.is_empty() {
            operation.notes = Some(notes.join("\n"));
        }

        Ok(Some(DiscoveredOperation {
            resource,
            resource_description,
            operation,
        }))
    }

    fn parse_type(
        &mut self,
        declaration: &FunctionDecl<'_>,
        annotation: &Annotation,
        type_expr: &str,
    ) -> Option<syn::Type> {
        match syn::parse_str::<syn::Type>(type_expr) {
            Ok(ty) => Some(ty),
            Err(e) => {
                let reason = format!("invalid type `{}`: {}", type_expr, e);
                self.malformed(declaration, annotation, &reason);
                None
            }
        }
    }

    fn malformed(&mut self, declaration: &FunctionDecl<'_>, annotation: &Annotation, reason: &str) {
        self.warn(Warning::MalformedAnnotation {
            declaration: declaration.name.clone(),
            line: annotation.source_line(),
            reason: reason.to_string(),
        });
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}

/// `a::b`, `/a/b/` and `crate::a::b` all name package `a/b`.
fn normalize_package(name: &str) -> String {
    let name = name.trim().replace("::", "/");
    let name = name.trim_matches('/');
    let name = name.strip_prefix("crate").map_or(name, |rest| {
        if rest.is_empty() || rest.starts_with('/') {
            rest.trim_start_matches('/')
        } else {
            name
        }
    });
    if name == "." {
        String::new()
    } else {
        name.to_string()
    }
}

/// `a/b/c` yields `a/b`, then `a`.
fn ancestors(package: &str) -> Vec<String> {
    package
        .match_indices('/')
        .rev()
        .map(|(i, _)| package[..i].to_string())
        .collect()
}

/// Top-level and inline-module functions plus associated functions, in
/// source order. Function bodies are not entered.
pub fn collect_functions(file: &ParsedFile) -> Vec<FunctionDecl<'_>> {
    let mut collector = FunctionCollector {
        file: &file.path,
        functions: Vec::new(),
    };
    collector.visit_file(&file.syntax_tree);
    collector.functions
}

struct FunctionCollector<'ast> {
    file: &'ast Path,
    functions: Vec<FunctionDecl<'ast>>,
}

impl<'ast> Visit<'ast> for FunctionCollector<'ast> {
    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.functions.push(FunctionDecl {
            name: item.sig.ident.to_string(),
            sig: &item.sig,
            attrs: &item.attrs,
            vis: &item.vis,
            self_ty: None,
            file: self.file,
        });
    }

    fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
        let self_ty = match item.self_ty.as_ref() {
            syn::Type::Path(type_path) => type_path
                .path
                .segments
                .last()
                .map(|s| s.ident.to_string()),
            _ => None,
        };

        for impl_item in &item.items {
            if let syn::ImplItem::Fn(method) = impl_item {
                let name = match &self_ty {
                    Some(ty) => format!("{}::{}", ty, method.sig.ident),
                    None => method.sig.ident.to_string(),
                };
                self.functions.push(FunctionDecl {
                    name,
                    sig: &method.sig,
                    attrs: &method.attrs,
                    vis: &method.vis,
                    self_ty: self_ty.clone(),
                    file: self.file,
                });
            }
        }
    }
}

/// Module paths found in one file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ModuleReferences {
    /// Packages reached through `use` trees, crate-relative type paths and
    /// the types named in the file's annotations
    pub packages: Vec<String>,
    /// Modules the file declares inline (`mod name { ... }`)
    pub inline_modules: Vec<String>,
}

pub fn module_references(file: &ParsedFile) -> ModuleReferences {
    let mut collector = PackageRefCollector {
        module_path: file
            .module_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        bare_paths_are_crate_relative: false,
        references: ModuleReferences::default(),
    };
    collector.visit_file(&file.syntax_tree);
    collector.references
}

struct PackageRefCollector {
    /// Module of the item being visited, including inline modules
    module_path: Vec<String>,
    /// Annotation types name crate modules without a `crate::` prefix.
    bare_paths_are_crate_relative: bool,
    references: ModuleReferences,
}

impl PackageRefCollector {
    fn record(&mut self, segments: &[String]) {
        let Some(package) = self.module_for(segments) else {
            return;
        };
        if !self.references.packages.contains(&package) {
            self.references.packages.push(package);
        }
    }

    /// Maps a module path as written in source onto a package name. `None`
    /// for paths into other crates.
    fn module_for(&self, segments: &[String]) -> Option<String> {
        let (first, rest) = segments.split_first()?;
        let mut base: Vec<String> = match first.as_str() {
            "crate" => Vec::new(),
            "self" => self.module_path.clone(),
            "super" => {
                let mut base = self.module_path.clone();
                base.pop();
                base
            }
            "std" | "core" | "alloc" => return None,
            _ if self.bare_paths_are_crate_relative => vec![first.clone()],
            _ => return None,
        };
        for segment in rest {
            if segment == "super" {
                base.pop();
            } else {
                base.push(segment.clone());
            }
        }
        Some(base.join("/"))
    }

    fn visit_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.visit_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(_) | syn::UseTree::Rename(_) | syn::UseTree::Glob(_) => {
                if !prefix.is_empty() {
                    let segments = prefix.clone();
                    self.record(&segments);
                }
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.visit_use(item, prefix);
                }
            }
        }
    }

    fn visit_annotation_types(&mut self, attrs: &[syn::Attribute]) {
        let mut type_exprs = Vec::new();
        for annotation in scan(&outer_doc(attrs)) {
            match annotation.tag {
                Tag::Param => {
                    if let Ok(spec) = annotation::parse_param(&annotation.value) {
                        type_exprs.push(spec.type_expr);
                    }
                }
                Tag::Success | Tag::Failure => {
                    if let Ok(spec) = annotation::parse_response(&annotation.value) {
                        type_exprs.extend(spec.body.map(|(_, ty)| ty));
                    }
                }
                _ => {}
            }
        }

        self.bare_paths_are_crate_relative = true;
        for ty in type_exprs.iter().filter_map(|e| syn::parse_str::<syn::Type>(e).ok()) {
            self.visit_type(&ty);
        }
        self.bare_paths_are_crate_relative = false;
    }
}

impl<'ast> Visit<'ast> for PackageRefCollector {
    fn visit_item_use(&mut self, item: &'ast syn::ItemUse) {
        self.visit_use(&item.tree, &mut Vec::new());
    }

    fn visit_type_path(&mut self, type_path: &'ast syn::TypePath) {
        let segments: Vec<String> = type_path
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        if segments.len() >= 2 {
            self.record(&segments[..segments.len() - 1]);
        }
        visit::visit_type_path(self, type_path);
    }

    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.visit_annotation_types(&item.attrs);
        self.visit_signature(&item.sig);
    }

    fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
        self.visit_annotation_types(&item.attrs);
        self.visit_signature(&item.sig);
    }

    fn visit_item_mod(&mut self, item: &'ast syn::ItemMod) {
        if item.content.is_none() {
            return;
        }
        self.module_path.push(item.ident.to_string());
        self.references.inline_modules.push(self.module_path.join("/"));
        visit::visit_item_mod(self, item);
        self.module_path.pop();
    }

    // Bodies are implementation detail; only declarations are followed.
    fn visit_block(&mut self, _block: &'ast syn::Block) {}
}
