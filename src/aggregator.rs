use crate::error::{Error, Result};
use crate::general_info::GeneralInfo;
use crate::model::{
    ApiDeclaration, ApiRef, Documentation, Model, Operation, ResourceListing, TypeRef,
    SWAGGER_VERSION,
};
use crate::registry::ModelRegistry;
use crate::walker::DiscoveredOperation;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeMap;

/// Resource name used for routes whose first segment is empty.
pub const ROOT_RESOURCE: &str = "root";

/// Groups discovered operations into per-resource declarations and builds
/// the listing that points at them.
pub struct DeclarationAggregator {
    general: GeneralInfo,
    /// Resolved base path, already overridden by the caller if needed
    base_path: String,
    /// Resource name -> (description, operations in discovery order)
    resources: BTreeMap<String, ResourceEntry>,
}

#[derive(Default)]
struct ResourceEntry {
    description: Option<String>,
    operations: Vec<Operation>,
}

impl DeclarationAggregator {
    pub fn new(general: GeneralInfo, base_path: impl Into<String>) -> Self {
        Self {
            general,
            base_path: base_path.into(),
            resources: BTreeMap::new(),
        }
    }

    /// Appends an operation to its resource. `@Resource` wins over the route.
    pub fn add(&mut self, discovered: DiscoveredOperation) {
        let resource = discovered
            .resource
            .unwrap_or_else(|| resource_for(&discovered.operation.path));
        debug!(
            "Adding {} {} to resource `{}`",
            discovered.operation.method, discovered.operation.path, resource
        );

        let entry = self.resources.entry(resource).or_default();
        if entry.description.is_none() {
            entry.description = discovered.resource_description;
        }
        entry.operations.push(discovered.operation);
    }

    /// Builds the final document, pulling every model the operations reach
    /// out of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedModel`] if an operation references a model
    /// the registry does not hold.
    pub fn build(self, registry: &ModelRegistry) -> Result<Documentation> {
        let mut apis = Vec::with_capacity(self.resources.len());
        let mut api_declarations = BTreeMap::new();

        for (resource, entry) in self.resources {
            let mut models = IndexMap::new();
            for type_ref in entry.operations.iter().flat_map(|op| op.type_refs()) {
                collect_models(type_ref, registry, &resource, &mut models)?;
            }

            let mut produces = Vec::new();
            let mut consumes = Vec::new();
            for operation in &entry.operations {
                union_into(&mut produces, &operation.produces);
                union_into(&mut consumes, &operation.consumes);
            }

            apis.push(ApiRef {
                path: resource.clone(),
                description: entry.description.unwrap_or_default(),
            });
            api_declarations.insert(
                resource.clone(),
                ApiDeclaration {
                    api_version: self.general.api_version.clone(),
                    swagger_version: SWAGGER_VERSION.to_string(),
                    base_path: self.base_path.clone(),
                    resource_path: format!("/{}", resource),
                    produces,
                    consumes,
                    operations: entry.operations,
                    models,
                },
            );
        }

        // BTreeMap iteration already yields unique, sorted resource names.
        Ok(Documentation {
            resource_listing: ResourceListing {
                api_version: self.general.api_version,
                swagger_version: SWAGGER_VERSION.to_string(),
                base_path: self.base_path,
                apis,
                info: self.general.info,
            },
            api_declarations,
        })
    }
}

/// The first path segment, or [`ROOT_RESOURCE`] when it is empty.
pub fn resource_for(path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.split('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => ROOT_RESOURCE.to_string(),
    }
}

/// Adds the model behind `type_ref`, then everything its properties reach,
/// in first-reference order.
fn collect_models(
    type_ref: &TypeRef,
    registry: &ModelRegistry,
    resource: &str,
    models: &mut IndexMap<String, Model>,
) -> Result<()> {
    let Some(name) = type_ref.model_name() else {
        return Ok(());
    };
    if models.contains_key(name) {
        return Ok(());
    }

    let model = registry.get(name).ok_or_else(|| Error::UnresolvedModel {
        model: name.to_string(),
        resource: resource.to_string(),
    })?;
    models.insert(name.to_string(), model.clone());

    for property in &model.properties {
        collect_models(&property.type_ref, registry, resource, models)?;
    }
    Ok(())
}

fn union_into(target: &mut Vec<String>, values: &[String]) {
    for value in values {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}
