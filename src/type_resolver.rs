use crate::error::{Error, Result};
use crate::model::{Primitive, PrimitiveType, Property, TypeRef};
use crate::parser::{outer_doc, ParsedFile};
use crate::registry::ModelRegistry;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutyKebabCase, ToShoutySnakeCase,
    ToSnakeCase,
};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;
use syn::visit::Visit;
use syn::{Fields, GenericArgument, PathArguments, Type, Visibility};

/// Wrapper types that serialize themselves as a primitive, by type name.
#[derive(Debug, Clone)]
pub struct TypeAliases {
    aliases: IndexMap<String, Primitive>,
}

impl TypeAliases {
    /// An empty table.
    pub fn empty() -> Self {
        Self {
            aliases: IndexMap::new(),
        }
    }

    /// Adds an alias; `primitive` is any name [`Primitive::from_name`]
    /// accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPrimitive`] if the primitive name is unknown.
    pub fn insert(&mut self, type_name: &str, primitive: &str) -> Result<()> {
        let resolved = Primitive::from_name(primitive).ok_or_else(|| Error::UnknownPrimitive {
            alias: type_name.to_string(),
            primitive: primitive.to_string(),
        })?;
        self.aliases.insert(type_name.to_string(), resolved);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&Primitive> {
        self.aliases.get(type_name)
    }
}

impl Default for TypeAliases {
    /// The nullable SQL wrappers.
    fn default() -> Self {
        let mut aliases = Self::empty();
        aliases.aliases.insert(
            "NullString".to_string(),
            Primitive::new(PrimitiveType::String),
        );
        aliases.aliases.insert(
            "NullInt64".to_string(),
            Primitive::new(PrimitiveType::Integer),
        );
        aliases.aliases.insert(
            "NullFloat64".to_string(),
            Primitive::new(PrimitiveType::Number),
        );
        aliases.aliases.insert(
            "NullBool".to_string(),
            Primitive::new(PrimitiveType::Boolean),
        );
        aliases
    }
}

/// A type definition found in a loaded package.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub package: String,
    pub item: TypeItem,
}

#[derive(Debug, Clone)]
pub enum TypeItem {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
    Alias(syn::ItemType),
}

/// Every struct, enum and `type` alias of the loaded packages, by name.
///
/// When two packages define the same name, the first package loaded wins.
#[derive(Debug, Default)]
pub struct TypeIndex {
    definitions: IndexMap<String, TypeDef>,
}

impl TypeIndex {
    pub fn build<'a>(files: impl IntoIterator<Item = &'a ParsedFile>) -> Self {
        let mut definitions = IndexMap::new();
        for file in files {
            let mut collector = TypeCollector {
                package: &file.package,
                definitions: &mut definitions,
            };
            collector.visit_file(&file.syntax_tree);
        }
        debug!("Indexed {} type definitions", definitions.len());
        Self { definitions }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.definitions.get(name)
    }
}

struct TypeCollector<'a> {
    package: &'a str,
    definitions: &'a mut IndexMap<String, TypeDef>,
}

impl TypeCollector<'_> {
    fn insert(&mut self, name: String, item: TypeItem) {
        if let Some(existing) = self.definitions.get(&name) {
            debug!(
                "Type {} in {} shadowed by earlier definition in {}",
                name, self.package, existing.package
            );
            return;
        }
        self.definitions.insert(
            name,
            TypeDef {
                package: self.package.to_string(),
                item,
            },
        );
    }
}

impl<'ast> Visit<'ast> for TypeCollector<'_> {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        self.insert(item.ident.to_string(), TypeItem::Struct(item.clone()));
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        self.insert(item.ident.to_string(), TypeItem::Enum(item.clone()));
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        self.insert(item.ident.to_string(), TypeItem::Alias(item.clone()));
    }

    // Items local to a function body cannot be named from a signature.
    fn visit_item_fn(&mut self, _item: &'ast syn::ItemFn) {}

    fn visit_impl_item_fn(&mut self, _item: &'ast syn::ImplItemFn) {}
}

/// Serde attributes relevant to the serialized shape of a field or struct
#[derive(Debug, Clone, Default)]
pub struct SerdeAttributes {
    /// Renamed field name
    pub rename: Option<String>,
    /// Container-level casing rule
    pub rename_all: Option<String>,
    /// Whether to skip this field during serialization
    pub skip: bool,
    /// Whether to flatten this field into its parent
    pub flatten: bool,
}

impl SerdeAttributes {
    pub fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut serde_attrs = SerdeAttributes::default();

        for attr in attrs {
            if !attr.path().is_ident("serde") {
                continue;
            }
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename = Some(value.value());
                } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde_attrs.rename_all = Some(value.value());
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    serde_attrs.skip = true;
                } else if meta.path.is_ident("flatten") {
                    serde_attrs.flatten = true;
                } else if meta.input.peek(syn::Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                } else if meta.input.peek(syn::token::Paren) {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    content.step(|cursor| {
                        let mut rest = *cursor;
                        while let Some((_, next)) = rest.token_tree() {
                            rest = next;
                        }
                        Ok(((), rest))
                    })?;
                }
                Ok(())
            });
            if let Err(e) = result {
                debug!("Ignoring unparseable serde attribute: {}", e);
            }
        }

        serde_attrs
    }

    /// Applies a `rename_all` rule to a snake_case field name.
    fn apply_rename_all(rule: &str, field_name: &str) -> String {
        match rule {
            "lowercase" => field_name.to_lowercase(),
            "UPPERCASE" => field_name.to_uppercase(),
            "camelCase" => field_name.to_lower_camel_case(),
            "PascalCase" => field_name.to_pascal_case(),
            "snake_case" => field_name.to_snake_case(),
            "SCREAMING_SNAKE_CASE" => field_name.to_shouty_snake_case(),
            "kebab-case" => field_name.to_kebab_case(),
            "SCREAMING-KEBAB-CASE" => field_name.to_shouty_kebab_case(),
            _ => field_name.to_string(),
        }
    }
}

/// Type resolver - maps Rust type expressions onto [`TypeRef`]s.
///
/// Named structs become models in the [`ModelRegistry`]. The registry entry is
/// reserved before the struct's fields are walked, which is what makes self-
/// and mutually-referencing structs terminate.
pub struct TypeResolver<'a> {
    index: &'a TypeIndex,
    aliases: &'a TypeAliases,
    registry: ModelRegistry,
    /// `type` aliases and newtypes currently being expanded
    expanding: HashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(index: &'a TypeIndex, aliases: &'a TypeAliases) -> Self {
        Self {
            index,
            aliases,
            registry: ModelRegistry::new(),
            expanding: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn into_registry(self) -> ModelRegistry {
        self.registry
    }

    /// Resolves `ty`, referenced from `declaration`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedType`] for anything that is neither a
    /// primitive, a wrapper, a collection nor a known definition.
    pub fn resolve(&mut self, ty: &Type, declaration: &str) -> Result<TypeRef> {
        match ty {
            Type::Reference(reference) => self.resolve(&reference.elem, declaration),
            Type::Ptr(pointer) => self.resolve(&pointer.elem, declaration),
            Type::Paren(paren) => self.resolve(&paren.elem, declaration),
            Type::Group(group) => self.resolve(&group.elem, declaration),
            Type::Slice(slice) => Ok(TypeRef::array(self.resolve(&slice.elem, declaration)?)),
            Type::Array(array) => Ok(TypeRef::array(self.resolve(&array.elem, declaration)?)),
            Type::Path(type_path) if type_path.qself.is_none() => {
                self.resolve_path(&type_path.path, declaration)
            }
            other => Err(unresolved(&describe(other), declaration)),
        }
    }

    fn resolve_path(&mut self, path: &syn::Path, declaration: &str) -> Result<TypeRef> {
        let segment = path
            .segments
            .last()
            .ok_or_else(|| unresolved("<empty path>", declaration))?;
        let name = segment.ident.to_string();
        let args = type_args(&segment.arguments);

        if let Some(primitive) = self.aliases.get(&name) {
            debug!("Type {} resolved through alias table", name);
            return Ok(TypeRef::Primitive(primitive.clone()));
        }
        if args.is_empty() {
            if let Some(primitive) = Primitive::from_name(&name) {
                return Ok(TypeRef::Primitive(primitive));
            }
        }

        match name.as_str() {
            "Option" | "Box" | "Rc" | "Arc" | "Cow" | "Cell" | "RefCell" | "Mutex" | "RwLock" => {
                let inner = args
                    .first()
                    .ok_or_else(|| unresolved(&describe_path(path), declaration))?;
                self.resolve(inner, declaration)
            }
            "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet"
            | "BinaryHeap" => {
                let inner = args
                    .first()
                    .ok_or_else(|| unresolved(&describe_path(path), declaration))?;
                Ok(TypeRef::array(self.resolve(inner, declaration)?))
            }
            "HashMap" | "BTreeMap" | "IndexMap" => {
                let value = args
                    .get(1)
                    .ok_or_else(|| unresolved(&describe_path(path), declaration))?;
                Ok(TypeRef::map(self.resolve(value, declaration)?))
            }
            _ if !args.is_empty() => Err(unresolved(&describe_path(path), declaration)),
            _ => self.resolve_named(&name, declaration),
        }
    }

    fn resolve_named(&mut self, name: &str, declaration: &str) -> Result<TypeRef> {
        if self.registry.contains(name) {
            return Ok(TypeRef::model(name));
        }

        let index = self.index;
        let definition = index
            .get(name)
            .ok_or_else(|| unresolved(name, declaration))?;

        match &definition.item {
            TypeItem::Alias(item_type) => {
                self.expand(name, declaration, |resolver| resolver.resolve(&item_type.ty, name))
            }
            TypeItem::Enum(item_enum) => {
                if item_enum.variants.iter().all(|v| matches!(v.fields, Fields::Unit)) {
                    Ok(TypeRef::primitive(PrimitiveType::String))
                } else {
                    Err(unresolved(name, declaration))
                }
            }
            TypeItem::Struct(item_struct) => match &item_struct.fields {
                Fields::Named(_) => self.resolve_struct(item_struct),
                Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                    let inner = &fields.unnamed[0].ty;
                    self.expand(name, declaration, |resolver| resolver.resolve(inner, name))
                }
                _ => Err(unresolved(name, declaration)),
            },
        }
    }

    /// Runs `f` with `name` marked as being expanded, failing on re-entry.
    fn expand(
        &mut self,
        name: &str,
        declaration: &str,
        f: impl FnOnce(&mut Self) -> Result<TypeRef>,
    ) -> Result<TypeRef> {
        if !self.expanding.insert(name.to_string()) {
            return Err(unresolved(name, declaration));
        }
        let result = f(self);
        self.expanding.remove(name);
        result
    }

    fn resolve_struct(&mut self, item_struct: &syn::ItemStruct) -> Result<TypeRef> {
        let name = item_struct.ident.to_string();
        self.registry.reserve(&name);

        let container = SerdeAttributes::parse(&item_struct.attrs);
        let mut properties: Vec<Property> = Vec::new();

        for field in &item_struct.fields {
            let Some(ident) = &field.ident else {
                continue;
            };
            let field_name = ident.to_string();
            if !matches!(field.vis, Visibility::Public(_)) {
                debug!("Skipping non-public field {}.{}", name, field_name);
                continue;
            }
            let serde_attrs = SerdeAttributes::parse(&field.attrs);
            if serde_attrs.skip {
                continue;
            }

            let declaration = format!("{}.{}", name, field_name);
            let type_ref = self.resolve(&field.ty, &declaration)?;

            if serde_attrs.flatten {
                let optional = is_option(&field.ty);
                self.flatten_into(&mut properties, &type_ref, optional, &declaration);
                continue;
            }

            let property_name = match (&serde_attrs.rename, &container.rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => SerdeAttributes::apply_rename_all(rule, &field_name),
                (None, None) => field_name,
            };
            properties.push(Property {
                name: property_name,
                type_ref,
                required: !is_option(&field.ty),
                description: description(&field.attrs),
            });
        }

        debug!("Model {} has {} properties", name, properties.len());
        self.registry
            .populate(&name, description(&item_struct.attrs), properties);
        Ok(TypeRef::model(name))
    }

    /// Copies the properties of the model behind `type_ref` into `properties`.
    /// Names already present win over flattened ones. Properties of an
    /// optional flattened field are never required.
    fn flatten_into(
        &self,
        properties: &mut Vec<Property>,
        type_ref: &TypeRef,
        optional: bool,
        declaration: &str,
    ) {
        let TypeRef::Model { name } = type_ref else {
            debug!("Cannot flatten {} ({}), skipping", declaration, type_ref);
            return;
        };
        let Some(model) = self.registry.get(name) else {
            return;
        };
        for property in &model.properties {
            if !properties.iter().any(|p| p.name == property.name) {
                let mut property = property.clone();
                property.required &= !optional;
                properties.push(property);
            }
        }
    }
}

fn unresolved(type_name: &str, declaration: &str) -> Error {
    Error::UnresolvedType {
        type_name: type_name.to_string(),
        declaration: declaration.to_string(),
    }
}

fn type_args(arguments: &PathArguments) -> Vec<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|s| s.ident == "Option")
            .unwrap_or(false),
        Type::Paren(paren) => is_option(&paren.elem),
        Type::Group(group) => is_option(&group.elem),
        _ => false,
    }
}

fn description(attrs: &[syn::Attribute]) -> Option<String> {
    let text = outer_doc(attrs)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Human-readable rendering of a type for error messages.
fn describe(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => describe_path(&type_path.path),
        Type::Reference(reference) => format!("&{}", describe(&reference.elem)),
        Type::Ptr(pointer) => format!("*{}", describe(&pointer.elem)),
        Type::Slice(slice) => format!("[{}]", describe(&slice.elem)),
        Type::Array(array) => format!("[{}; _]", describe(&array.elem)),
        Type::Paren(paren) => describe(&paren.elem),
        Type::Group(group) => describe(&group.elem),
        Type::Tuple(tuple) => format!(
            "({})",
            tuple.elems.iter().map(describe).collect::<Vec<_>>().join(", ")
        ),
        Type::TraitObject(_) => "dyn trait object".to_string(),
        Type::ImplTrait(_) => "impl trait".to_string(),
        Type::BareFn(_) => "fn pointer".to_string(),
        Type::Never(_) => "!".to_string(),
        Type::Infer(_) => "_".to_string(),
        Type::Macro(_) => "type macro".to_string(),
        _ => "unsupported type".to_string(),
    }
}

fn describe_path(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| {
            let args = type_args(&segment.arguments);
            if args.is_empty() {
                segment.ident.to_string()
            } else {
                format!(
                    "{}<{}>",
                    segment.ident,
                    args.iter().map(|t| describe(t)).collect::<Vec<_>>().join(", ")
                )
            }
        })
        .collect::<Vec<_>>()
        .join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::AstParser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn index_from(code: &str) -> TypeIndex {
        let parsed = AstParser::parse_source(Path::new("models.rs"), "models", code).unwrap();
        TypeIndex::build(&[parsed])
    }

    fn ty(expr: &str) -> Type {
        syn::parse_str(expr).unwrap()
    }

    fn string() -> TypeRef {
        TypeRef::primitive(PrimitiveType::String)
    }

    fn int64() -> TypeRef {
        TypeRef::Primitive(Primitive::from_name("i64").unwrap())
    }

    #[test]
    fn test_primitives() {
        let index = TypeIndex::default();
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(resolver.resolve(&ty("String"), "test").unwrap(), string());
        assert_eq!(resolver.resolve(&ty("&str"), "test").unwrap(), string());
        assert_eq!(resolver.resolve(&ty("i64"), "test").unwrap(), int64());
        assert_eq!(
            resolver.resolve(&ty("bool"), "test").unwrap(),
            TypeRef::primitive(PrimitiveType::Boolean)
        );
        assert_eq!(
            resolver.resolve(&ty("f64"), "test").unwrap().to_string(),
            "number(double)"
        );
        assert!(resolver.registry().is_empty());
    }

    #[test]
    fn test_pointers_resolve_to_pointee() {
        let index = TypeIndex::default();
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        for expr in ["Box<i64>", "&i64", "*const i64", "Arc<i64>", "Option<Box<i64>>"] {
            assert_eq!(resolver.resolve(&ty(expr), "test").unwrap(), int64(), "{}", expr);
        }
    }

    #[test]
    fn test_collections() {
        let index = TypeIndex::default();
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(
            resolver.resolve(&ty("Vec<String>"), "test").unwrap(),
            TypeRef::array(string())
        );
        assert_eq!(
            resolver.resolve(&ty("&[i64]"), "test").unwrap(),
            TypeRef::array(int64())
        );
        assert_eq!(
            resolver.resolve(&ty("[String; 4]"), "test").unwrap(),
            TypeRef::array(string())
        );
        assert_eq!(
            resolver
                .resolve(&ty("HashMap<String, Vec<i64>>"), "test")
                .unwrap(),
            TypeRef::map(TypeRef::array(int64()))
        );
    }

    #[test]
    fn test_struct_becomes_model() {
        let index = index_from(
            r#"
            /// A widget.
            pub struct Widget {
                /// Identifier
                pub id: i64,
                pub name: String,
                pub nickname: Option<String>,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(
            resolver.resolve(&ty("Widget"), "get_widget").unwrap(),
            TypeRef::model("Widget")
        );

        let widget = resolver.registry().get("Widget").unwrap();
        assert_eq!(widget.description.as_deref(), Some("A widget."));
        assert_eq!(
            widget.properties,
            vec![
                Property {
                    name: "id".to_string(),
                    type_ref: int64(),
                    required: true,
                    description: Some("Identifier".to_string()),
                },
                Property {
                    name: "name".to_string(),
                    type_ref: string(),
                    required: true,
                    description: None,
                },
                Property {
                    name: "nickname".to_string(),
                    type_ref: string(),
                    required: false,
                    description: None,
                },
            ]
        );
        let required: Vec<_> = widget
            .properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(required, vec!["id", "name"]);
    }

    #[test]
    fn test_resolving_twice_registers_once() {
        let index = index_from("pub struct Widget { pub id: i64 }");
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        let first = resolver.resolve(&ty("Widget"), "a").unwrap();
        let second = resolver.resolve(&ty("Vec<Widget>"), "b").unwrap();

        assert_eq!(first, TypeRef::model("Widget"));
        assert_eq!(second, TypeRef::array(TypeRef::model("Widget")));
        assert_eq!(resolver.registry().len(), 1);
    }

    #[test]
    fn test_self_referential_struct_terminates() {
        let index = index_from(
            r#"
            pub struct Category {
                pub name: String,
                pub parent: Option<Box<Category>>,
                pub children: Vec<Category>,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(
            resolver.resolve(&ty("Category"), "test").unwrap(),
            TypeRef::model("Category")
        );
        let category = resolver.registry().get("Category").unwrap();
        assert_eq!(category.properties[1].type_ref, TypeRef::model("Category"));
        assert_eq!(
            category.properties[2].type_ref,
            TypeRef::array(TypeRef::model("Category"))
        );
        assert_eq!(resolver.registry().len(), 1);
    }

    #[test]
    fn test_mutually_referential_structs_terminate() {
        let index = index_from(
            r#"
            pub struct Author { pub name: String, pub books: Vec<Book> }
            pub struct Book { pub title: String, pub author: Author }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        resolver.resolve(&ty("Author"), "test").unwrap();
        resolver.resolve(&ty("Book"), "test").unwrap();

        let ids: Vec<_> = resolver.registry().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["Author", "Book"]);
        assert_eq!(
            resolver.registry().get("Book").unwrap().properties[1].type_ref,
            TypeRef::model("Author")
        );
    }

    #[test]
    fn test_alias_table_bypasses_struct() {
        let index = index_from("pub struct NullString { pub value: String, pub valid: bool }");
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(
            resolver.resolve(&ty("NullString"), "test").unwrap(),
            string()
        );
        assert_eq!(
            resolver.resolve(&ty("Option<NullInt64>"), "test").unwrap(),
            TypeRef::primitive(PrimitiveType::Integer)
        );
        assert!(resolver.registry().is_empty());
    }

    #[test]
    fn test_custom_alias() {
        let index = TypeIndex::default();
        let mut aliases = TypeAliases::empty();
        aliases.insert("Uuid", "string").unwrap();
        match aliases.insert("Decimal", "money").unwrap_err() {
            Error::UnknownPrimitive { alias, primitive } => {
                assert_eq!(alias, "Decimal");
                assert_eq!(primitive, "money");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(aliases.get("Decimal").is_none());
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(resolver.resolve(&ty("uuid::Uuid"), "test").unwrap(), string());
    }

    #[test]
    fn test_unexported_and_skipped_fields_are_excluded() {
        let index = index_from(
            r#"
            pub struct Account {
                pub id: i64,
                password_hash: String,
                pub(crate) internal: String,
                #[serde(skip)]
                pub cache: String,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);
        resolver.resolve(&ty("Account"), "test").unwrap();

        let names: Vec<_> = resolver
            .registry()
            .get("Account")
            .unwrap()
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn test_flattened_fields_merge_into_parent() {
        let index = index_from(
            r#"
            pub struct Audit { pub created_by: String, pub id: String }
            pub struct Invoice {
                pub id: i64,
                #[serde(flatten)]
                pub audit: Audit,
                pub total: f64,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);
        resolver.resolve(&ty("Invoice"), "test").unwrap();

        let invoice = resolver.registry().get("Invoice").unwrap();
        let names: Vec<_> = invoice.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "created_by", "total"]);
        assert_eq!(invoice.properties[0].type_ref, int64());
        assert!(invoice.properties[1].required);
    }

    #[test]
    fn test_optional_flattened_fields_are_not_required() {
        let index = index_from(
            r#"
            pub struct Audit { pub created_by: String, pub note: Option<String> }
            pub struct Invoice {
                pub id: i64,
                #[serde(flatten)]
                pub audit: Option<Audit>,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);
        resolver.resolve(&ty("Invoice"), "test").unwrap();

        let invoice = resolver.registry().get("Invoice").unwrap();
        let required: Vec<_> = invoice
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(
            required,
            vec![("id", true), ("created_by", false), ("note", false)]
        );
        // The flattened model keeps its own requirements.
        assert!(resolver.registry().get("Audit").unwrap().properties[0].required);
    }

    #[test]
    fn test_serde_renames() {
        let index = index_from(
            r#"
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            pub struct Order {
                pub order_id: i64,
                #[serde(rename = "total", skip_serializing_if = "Option::is_none")]
                pub grand_total: Option<f64>,
            }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);
        resolver.resolve(&ty("Order"), "test").unwrap();

        let names: Vec<_> = resolver
            .registry()
            .get("Order")
            .unwrap()
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["orderId", "total"]);
    }

    #[test]
    fn test_type_alias_and_newtype() {
        let index = index_from(
            r#"
            pub type WidgetId = i64;
            pub struct Sku(String);
            pub type Widgets = Vec<Widget>;
            pub struct Widget { pub id: WidgetId, pub sku: Sku }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(resolver.resolve(&ty("WidgetId"), "test").unwrap(), int64());
        assert_eq!(
            resolver.resolve(&ty("Widgets"), "test").unwrap(),
            TypeRef::array(TypeRef::model("Widget"))
        );
        let widget = resolver.registry().get("Widget").unwrap();
        assert_eq!(widget.properties[0].type_ref, int64());
        assert_eq!(widget.properties[1].type_ref, string());
    }

    #[test]
    fn test_unit_enum_is_string() {
        let index = index_from("pub enum Status { Active, Retired }");
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        assert_eq!(resolver.resolve(&ty("Status"), "test").unwrap(), string());
    }

    #[test]
    fn test_unresolvable_types_are_errors() {
        let index = index_from(
            r#"
            pub enum Shape { Circle(f64), Square { side: f64 } }
            pub type Loop = Loop2;
            pub type Loop2 = Loop;
            pub struct Holder { pub thing: Gizmo }
            "#,
        );
        let aliases = TypeAliases::default();
        let mut resolver = TypeResolver::new(&index, &aliases);

        for expr in ["Gizmo", "Shape", "(i64, String)", "Box<dyn Fn()>", "Loop"] {
            assert!(resolver.resolve(&ty(expr), "get_thing").is_err(), "{}", expr);
        }

        match resolver.resolve(&ty("Holder"), "get_holder").unwrap_err() {
            Error::UnresolvedType {
                type_name,
                declaration,
            } => {
                assert_eq!(type_name, "Gizmo");
                assert_eq!(declaration, "Holder.thing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_functions_bodies_are_not_indexed() {
        let index = index_from(
            r#"
            pub fn handler() {
                struct Local { pub x: i64 }
            }
            pub mod nested {
                pub struct Visible { pub x: i64 }
            }
            "#,
        );
        assert!(index.get("Local").is_none());
        assert_eq!(index.get("Visible").unwrap().package, "models");
    }
}
