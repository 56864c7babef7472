//! Renderers for a finished [`Documentation`].
//!
//! JSON and YAML carry the full bundle (listing plus every declaration) and
//! parse back into an equal structure. Markdown is a human-readable view with
//! one section per resource.

use crate::error::Result;
use crate::model::{ApiDeclaration, Documentation, Model, Operation};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes the documentation to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```no_run
/// use swagger_lite::generator::{generate, GeneratorConfig};
/// use swagger_lite::serializer::serialize_json;
/// use swagger_lite::walker::AnyFunction;
///
/// let generated = generate(&GeneratorConfig::new("api"), &AnyFunction).unwrap();
/// println!("{}", serialize_json(&generated.documentation).unwrap());
/// ```
pub fn serialize_json(doc: &Documentation) -> Result<String> {
    debug!("Serializing documentation to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Serializes the documentation to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &Documentation) -> Result<String> {
    debug!("Serializing documentation to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Renders the documentation as GitHub-flavoured markdown tables.
pub fn render_markdown(doc: &Documentation) -> String {
    debug!("Rendering documentation as markdown");
    let listing = &doc.resource_listing;
    let mut lines: Vec<String> = Vec::new();

    let title = if listing.info.title.is_empty() {
        "API"
    } else {
        listing.info.title.as_str()
    };
    lines.push(format!("# {}\n", title));
    if !listing.info.description.is_empty() {
        lines.push(format!("{}\n", listing.info.description));
    }
    lines.push(format!("- API version: {}", listing.api_version));
    lines.push(format!("- Base path: {}", listing.base_path));
    if let Some(ref contact) = listing.info.contact {
        lines.push(format!("- Contact: {}", contact));
    }
    if let Some(ref license) = listing.info.license {
        match listing.info.license_url {
            Some(ref url) => lines.push(format!("- License: [{}]({})", license, url)),
            None => lines.push(format!("- License: {}", license)),
        }
    }
    if let Some(ref terms) = listing.info.terms_of_service_url {
        lines.push(format!("- Terms of service: {}", terms));
    }
    lines.push(String::new());

    for api in &listing.apis {
        let Some(declaration) = doc.api_declarations.get(&api.path) else {
            continue;
        };
        lines.push(format!("## {}\n", declaration.resource_path));
        if !api.description.is_empty() {
            lines.push(format!("{}\n", api.description));
        }
        render_declaration(declaration, &mut lines);
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}

fn render_declaration(declaration: &ApiDeclaration, lines: &mut Vec<String>) {
    lines.push("| Method | Path | Summary |".to_string());
    lines.push("| --- | --- | --- |".to_string());
    for operation in &declaration.operations {
        lines.push(format!(
            "| {} | `{}` | {} |",
            operation.method,
            operation.path,
            cell(operation.summary.as_deref().unwrap_or(""))
        ));
    }
    lines.push(String::new());

    for operation in &declaration.operations {
        render_operation(operation, lines);
    }

    for model in declaration.models.values() {
        render_model(model, lines);
    }
}

fn render_operation(operation: &Operation, lines: &mut Vec<String>) {
    lines.push(format!("### {} {}\n", operation.method, operation.path));
    if let Some(ref notes) = operation.notes {
        lines.push(format!("{}\n", notes));
    }
    if let Some(ref response_type) = operation.response_type {
        lines.push(format!("Returns `{}`.\n", response_type));
    }

    if !operation.parameters.is_empty() {
        lines.push("| Parameter | In | Type | Required | Description |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for param in &operation.parameters {
            lines.push(format!(
                "| {} | {} | `{}` | {} | {} |",
                param.name,
                param.location.as_str(),
                param.type_ref,
                param.required,
                cell(param.description.as_deref().unwrap_or(""))
            ));
        }
        lines.push(String::new());
    }

    if !operation.response_messages.is_empty() {
        lines.push("| Code | Message | Model |".to_string());
        lines.push("| --- | --- | --- |".to_string());
        for response in &operation.response_messages {
            let model = response
                .response_model
                .as_ref()
                .map(|t| format!("`{}`", t))
                .unwrap_or_default();
            lines.push(format!(
                "| {} | {} | {} |",
                response.code,
                cell(&response.message),
                model
            ));
        }
        lines.push(String::new());
    }
}

fn render_model(model: &Model, lines: &mut Vec<String>) {
    lines.push(format!("### Model `{}`\n", model.id));
    if let Some(ref description) = model.description {
        lines.push(format!("{}\n", description));
    }
    lines.push("| Property | Type | Required | Description |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    for property in &model.properties {
        lines.push(format!(
            "| {} | `{}` | {} | {} |",
            property.name,
            property.type_ref,
            property.required,
            cell(property.description.as_deref().unwrap_or(""))
        ));
    }
    lines.push(String::new());
}

/// Keeps free text inside one table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br>")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ApiInfo, ApiRef, HttpMethod, ParamLocation, Parameter, PrimitiveType, Property,
        ResourceListing, ResponseMessage, TypeRef,
    };
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn create_test_document() -> Documentation {
        let mut operation = Operation::new(HttpMethod::Get, "/widgets/{id}", "get_widget");
        operation.summary = Some("Get a widget".to_string());
        operation.response_type = Some(TypeRef::model("Widget"));
        operation.parameters.push(Parameter {
            name: "id".to_string(),
            location: ParamLocation::Path,
            type_ref: TypeRef::primitive(PrimitiveType::Integer),
            required: true,
            description: Some("Widget id".to_string()),
        });
        operation.response_messages.push(ResponseMessage {
            code: 404,
            message: "Not Found".to_string(),
            response_model: None,
        });

        let mut widget = Model::new("Widget");
        widget.properties.push(Property {
            name: "name".to_string(),
            type_ref: TypeRef::primitive(PrimitiveType::String),
            required: true,
            description: Some("Display name | short".to_string()),
        });
        let mut models = IndexMap::new();
        models.insert("Widget".to_string(), widget);

        let mut api_declarations = BTreeMap::new();
        api_declarations.insert(
            "widgets".to_string(),
            ApiDeclaration {
                api_version: "1.0.0".to_string(),
                swagger_version: "1.2".to_string(),
                base_path: "/api".to_string(),
                resource_path: "/widgets".to_string(),
                produces: vec!["application/json".to_string()],
                consumes: Vec::new(),
                operations: vec![operation],
                models,
            },
        );

        Documentation {
            resource_listing: ResourceListing {
                api_version: "1.0.0".to_string(),
                swagger_version: "1.2".to_string(),
                base_path: "/api".to_string(),
                apis: vec![ApiRef {
                    path: "widgets".to_string(),
                    description: "Widget operations".to_string(),
                }],
                info: ApiInfo {
                    title: "Test API".to_string(),
                    description: "A test API".to_string(),
                    ..ApiInfo::default()
                },
            },
            api_declarations,
        }
    }

    #[test]
    fn test_serialize_json() {
        let doc = create_test_document();
        let json = serialize_json(&doc).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["resourceListing"]["swaggerVersion"], "1.2");
        assert_eq!(parsed["resourceListing"]["apis"][0]["path"], "widgets");
        assert_eq!(parsed["resourceListing"]["info"]["title"], "Test API");

        let operation = &parsed["apiDeclarations"]["widgets"]["operations"][0];
        assert_eq!(operation["method"], "GET");
        assert_eq!(operation["type"]["$ref"], "Widget");
        assert_eq!(operation["parameters"][0]["paramType"], "path");
        assert_eq!(operation["parameters"][0]["type"], "integer");
        assert_eq!(operation["responseMessages"][0]["code"], 404);
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&create_test_document()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  "));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("resourceListing:"));
        assert!(yaml.contains("apiDeclarations:"));
        assert!(yaml.contains("resourcePath: /widgets"));
    }

    #[test]
    fn test_roundtrip_json_serialization() {
        let doc = create_test_document();
        let json = serialize_json(&doc).unwrap();

        let deserialized: Documentation = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_roundtrip_yaml_serialization() {
        let doc = create_test_document();
        let yaml = serialize_yaml(&doc).unwrap();

        let deserialized: Documentation = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_render_markdown() {
        let markdown = render_markdown(&create_test_document());

        assert!(markdown.starts_with("# Test API\n"));
        assert!(markdown.contains("## /widgets\n"));
        assert!(markdown.contains("Widget operations"));
        assert!(markdown.contains("| GET | `/widgets/{id}` | Get a widget |"));
        assert!(markdown.contains("Returns `Widget`."));
        assert!(markdown.contains("| id | path | `integer` | true | Widget id |"));
        assert!(markdown.contains("| 404 | Not Found |  |"));
        assert!(markdown.contains("### Model `Widget`"));
        assert!(markdown.contains("| name | `string` | true | Display name \\| short |"));
    }

    #[test]
    fn test_render_markdown_without_title() {
        let mut doc = create_test_document();
        doc.resource_listing.info = ApiInfo::default();

        let markdown = render_markdown(&doc);
        assert!(markdown.starts_with("# API\n"));
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.json");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("test.md");

        write_to_file("test content", &file_path).unwrap();

        assert!(file_path.exists());
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}
