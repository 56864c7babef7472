//! Annotation scanning for doc comments.
//!
//! [`scan`] turns a comment block into `(tag, value)` pairs in source order.
//! Lines that are not a recognized `@Tag` are ordinary prose and are dropped.
//! The `parse_*` helpers interpret the raw value of a single tag; they return
//! a reason string on malformed input so the caller can warn and move on.

use crate::model::{HttpMethod, ParamLocation};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\*\s*)?@([A-Za-z]+)(?:\s+(.*?))?\s*$").unwrap());

static ROUTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\S+)\s+\[\s*(\w+)\s*\]$").unwrap());

/// Tags recognized by the scanner. Keywords are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    // General API info
    ApiVersion,
    ApiTitle,
    ApiDescription,
    Contact,
    TermsOfServiceUrl,
    License,
    LicenseUrl,
    BasePath,

    // Operations
    Title,
    Description,
    Resource,
    Router,
    Param,
    Success,
    Failure,
    Accept,
    Produce,
}

impl Tag {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let tag = match keyword {
            "APIVersion" => Tag::ApiVersion,
            "APITitle" => Tag::ApiTitle,
            "APIDescription" => Tag::ApiDescription,
            "Contact" => Tag::Contact,
            "TermsOfServiceUrl" => Tag::TermsOfServiceUrl,
            "License" => Tag::License,
            "LicenseUrl" => Tag::LicenseUrl,
            "BasePath" => Tag::BasePath,
            "Title" => Tag::Title,
            "Description" => Tag::Description,
            "Resource" => Tag::Resource,
            "Router" => Tag::Router,
            "Param" => Tag::Param,
            "Success" => Tag::Success,
            "Failure" => Tag::Failure,
            "Accept" => Tag::Accept,
            "Produce" => Tag::Produce,
            _ => return None,
        };
        Some(tag)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Tag::ApiVersion => "APIVersion",
            Tag::ApiTitle => "APITitle",
            Tag::ApiDescription => "APIDescription",
            Tag::Contact => "Contact",
            Tag::TermsOfServiceUrl => "TermsOfServiceUrl",
            Tag::License => "License",
            Tag::LicenseUrl => "LicenseUrl",
            Tag::BasePath => "BasePath",
            Tag::Title => "Title",
            Tag::Description => "Description",
            Tag::Resource => "Resource",
            Tag::Router => "Router",
            Tag::Param => "Param",
            Tag::Success => "Success",
            Tag::Failure => "Failure",
            Tag::Accept => "Accept",
            Tag::Produce => "Produce",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub tag: Tag,
    pub value: String,
}

impl Annotation {
    /// The annotation as it would appear in a comment, for diagnostics.
    pub fn source_line(&self) -> String {
        if self.value.is_empty() {
            format!("@{}", self.tag.keyword())
        } else {
            format!("@{} {}", self.tag.keyword(), self.value)
        }
    }
}

/// Scans a comment block into recognized annotations, preserving order.
pub fn scan(comment: &str) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for line in comment.lines() {
        let Some(captures) = ANNOTATION_REGEX.captures(line) else {
            continue;
        };
        let keyword = &captures[1];
        match Tag::from_keyword(keyword) {
            Some(tag) => annotations.push(Annotation {
                tag,
                value: captures
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            }),
            None => debug!("Ignoring unknown annotation @{}", keyword),
        }
    }

    annotations
}

/// A parsed `@Router` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub method: HttpMethod,
}

/// A parsed `@Param` value. The type is still an unresolved expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub type_expr: String,
    pub required: bool,
    pub description: Option<String>,
}

/// Shape of a response body named in `@Success`/`@Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Object,
    Array,
}

/// A parsed `@Success`/`@Failure` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    pub code: u16,
    pub body: Option<(BodyKind, String)>,
    pub description: Option<String>,
}

/// `<path> [<method>]`
pub fn parse_route(value: &str) -> Result<Route, String> {
    let captures = ROUTER_REGEX
        .captures(value.trim())
        .ok_or_else(|| "expected `<path> [<method>]`".to_string())?;

    let path = captures[1].to_string();
    if !path.starts_with('/') {
        return Err(format!("route path `{}` must start with `/`", path));
    }
    let method = HttpMethod::parse(&captures[2])
        .ok_or_else(|| format!("unknown HTTP method `{}`", &captures[2]))?;

    Ok(Route { path, method })
}

/// `<name> <location> <type> <required> ["description"]`
pub fn parse_param(value: &str) -> Result<ParamSpec, String> {
    let fields = split_fields(value);
    if fields.len() < 4 {
        return Err(format!(
            "expected name, location, type and required flag, got {} field(s)",
            fields.len()
        ));
    }

    let location = ParamLocation::parse(&fields[1])
        .ok_or_else(|| format!("unknown parameter location `{}`", fields[1]))?;
    let required = match fields[3].as_str() {
        "true" => true,
        "false" => false,
        other => return Err(format!("required flag must be true or false, got `{}`", other)),
    };

    Ok(ParamSpec {
        name: fields[0].clone(),
        location,
        type_expr: fields[2].clone(),
        required,
        description: join_description(&fields[4..]),
    })
}

/// `<code> [{object}|{array} <type>] ["description"]`
pub fn parse_response(value: &str) -> Result<ResponseSpec, String> {
    let fields = split_fields(value);
    let code_field = fields
        .first()
        .ok_or_else(|| "expected a status code".to_string())?;
    let code: u16 = code_field
        .parse()
        .map_err(|_| format!("invalid status code `{}`", code_field))?;

    let mut rest = &fields[1..];
    let mut body = None;
    if let Some(first) = rest.first() {
        if first.starts_with('{') {
            let kind = match first.as_str() {
                "{object}" => BodyKind::Object,
                "{array}" => BodyKind::Array,
                other => return Err(format!("unknown body kind `{}`", other)),
            };
            let type_expr = rest
                .get(1)
                .ok_or_else(|| format!("{} must be followed by a type", first))?;
            body = Some((kind, type_expr.clone()));
            rest = &rest[2..];
        }
    }

    Ok(ResponseSpec {
        code,
        body,
        description: join_description(rest),
    })
}

/// `<resource> [description]`, with the leading slash optional.
pub fn parse_resource(value: &str) -> Result<(String, Option<String>), String> {
    let value = value.trim();
    let (name, description) = match value.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, join_description(&[rest.trim().to_string()])),
        None => (value, None),
    };
    let name = name.trim_matches('/');
    if name.is_empty() {
        return Err("expected a resource name".to_string());
    }
    Ok((name.to_string(), description))
}

/// Comma or whitespace separated MIME types, with short names expanded.
pub fn parse_mime_types(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(normalize_mime_type)
        .collect()
}

fn normalize_mime_type(mime: &str) -> String {
    match mime {
        "json" => "application/json",
        "xml" => "application/xml",
        "plain" => "text/plain",
        "html" => "text/html",
        "form" => "application/x-www-form-urlencoded",
        "mpfd" => "multipart/form-data",
        other => other,
    }
    .to_string()
}

/// Splits on whitespace, keeping quoted text and bracketed type arguments
/// (`HashMap<String, Widget>`) together.
fn split_fields(value: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth = 0usize;

    for c in value.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '<' | '[' | '(' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            '>' | ']' | ')' if !in_quotes => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes && depth == 0 => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }

    fields
}

fn join_description(fields: &[String]) -> Option<String> {
    let joined = fields.join(" ");
    let trimmed = joined.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
