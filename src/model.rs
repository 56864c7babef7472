//! Document model shared by the walker, the aggregator and the renderers.
//!
//! The shapes follow the Swagger 1.2 layout: a [`ResourceListing`] pointing at
//! one [`ApiDeclaration`] per resource, each carrying its [`Operation`]s and
//! the [`Model`]s they reference.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SWAGGER_VERSION: &str = "1.2";

/// HTTP methods accepted by `@Router`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Parses a method name, ignoring case.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter value travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Header,
    Form,
}

impl ParamLocation {
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "body" => Some(ParamLocation::Body),
            "header" => Some(ParamLocation::Header),
            "form" | "formData" => Some(ParamLocation::Form),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
            ParamLocation::Header => "header",
            ParamLocation::Form => "form",
        }
    }
}

/// The four primitive kinds of the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Integer,
    Number,
    Boolean,
}

/// A primitive with its optional width/precision format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Primitive {
    #[serde(rename = "type")]
    pub kind: PrimitiveType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Primitive {
    pub fn new(kind: PrimitiveType) -> Self {
        Self { kind, format: None }
    }

    fn with_format(kind: PrimitiveType, format: &str) -> Self {
        Self {
            kind,
            format: Some(format.to_string()),
        }
    }

    /// Maps a Rust primitive or an output primitive name to a [`Primitive`].
    ///
    /// Both spellings are accepted because annotation authors and alias tables
    /// use either (`i64`, `int`, `integer`).
    pub fn from_name(name: &str) -> Option<Self> {
        let primitive = match name {
            "String" | "str" | "char" | "string" => Self::new(PrimitiveType::String),
            "i8" | "i16" | "i32" | "u8" | "u16" | "u32" | "int32" => {
                Self::with_format(PrimitiveType::Integer, "int32")
            }
            "i64" | "i128" | "u64" | "u128" | "isize" | "usize" | "int64" => {
                Self::with_format(PrimitiveType::Integer, "int64")
            }
            "int" | "integer" => Self::new(PrimitiveType::Integer),
            "f32" | "float" => Self::with_format(PrimitiveType::Number, "float"),
            "f64" | "double" => Self::with_format(PrimitiveType::Number, "double"),
            "number" => Self::new(PrimitiveType::Number),
            "bool" | "boolean" => Self::new(PrimitiveType::Boolean),
            _ => return None,
        };
        Some(primitive)
    }
}

/// Collection shape of a [`TypeRef::Container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Slices, vectors and sets.
    Array,
    /// String-keyed maps; only the value type is modeled.
    Object,
}

/// A resolved type usage.
///
/// `Model` is a by-name reference into the model registry and never owns the
/// model itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Model {
        #[serde(rename = "$ref")]
        name: String,
    },
    Container {
        #[serde(rename = "type")]
        kind: ContainerKind,
        items: Box<TypeRef>,
    },
    Primitive(Primitive),
}

impl TypeRef {
    pub fn primitive(kind: PrimitiveType) -> Self {
        TypeRef::Primitive(Primitive::new(kind))
    }

    pub fn model(name: impl Into<String>) -> Self {
        TypeRef::Model { name: name.into() }
    }

    pub fn array(items: TypeRef) -> Self {
        TypeRef::Container {
            kind: ContainerKind::Array,
            items: Box::new(items),
        }
    }

    pub fn map(values: TypeRef) -> Self {
        TypeRef::Container {
            kind: ContainerKind::Object,
            items: Box::new(values),
        }
    }

    /// Name of the model this reference ultimately points at, looking
    /// through containers.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            TypeRef::Model { name } => Some(name),
            TypeRef::Container { items, .. } => items.model_name(),
            TypeRef::Primitive(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Model { name } => f.write_str(name),
            TypeRef::Container {
                kind: ContainerKind::Array,
                items,
            } => write!(f, "array[{}]", items),
            TypeRef::Container {
                kind: ContainerKind::Object,
                items,
            } => write!(f, "map[string]{}", items),
            TypeRef::Primitive(p) => match &p.format {
                Some(format) => write!(f, "{}({})", primitive_name(p.kind), format),
                None => f.write_str(primitive_name(p.kind)),
            },
        }
    }
}

fn primitive_name(kind: PrimitiveType) -> &'static str {
    match kind {
        PrimitiveType::String => "string",
        PrimitiveType::Integer => "integer",
        PrimitiveType::Number => "number",
        PrimitiveType::Boolean => "boolean",
    }
}

/// One field of a [`Model`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(flatten)]
    pub type_ref: TypeRef,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A named structured type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<Property>,
}

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            properties: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "paramType")]
    pub location: ParamLocation,
    #[serde(flatten)]
    pub type_ref: TypeRef,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_model: Option<TypeRef>,
}

/// One documented controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub method: HttpMethod,
    pub path: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<TypeRef>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_messages: Vec<ResponseMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
}

impl Operation {
    pub fn new(method: HttpMethod, path: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            nickname: nickname.into(),
            summary: None,
            notes: None,
            response_type: None,
            parameters: Vec::new(),
            response_messages: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    /// Every type this operation mentions, in declaration order.
    pub fn type_refs(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters
            .iter()
            .map(|p| &p.type_ref)
            .chain(self.response_type.iter())
            .chain(
                self.response_messages
                    .iter()
                    .filter_map(|m| m.response_model.as_ref()),
            )
    }
}

/// Entry of the listing pointing at one resource's declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRef {
    pub path: String,
    #[serde(default)]
    pub description: String,
}

/// General API metadata read from the root file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListing {
    pub api_version: String,
    pub swagger_version: String,
    pub base_path: String,
    pub apis: Vec<ApiRef>,
    pub info: ApiInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeclaration {
    pub api_version: String,
    pub swagger_version: String,
    pub base_path: String,
    pub resource_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub models: IndexMap<String, Model>,
}

/// The finished output: a listing and the declarations it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub resource_listing: ResourceListing,
    pub api_declarations: BTreeMap<String, ApiDeclaration>,
}
