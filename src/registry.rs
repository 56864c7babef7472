use crate::model::{Model, Property};
use indexmap::IndexMap;
use log::debug;

/// Models discovered during a run, keyed by type name.
///
/// An entry is reserved before its fields are walked, so a type that reaches
/// itself again through its fields finds the reservation and stops there.
/// Insertion order is kept for reproducible output.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Model>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `name` with an empty model. Returns `false` if the name was
    /// already present, in which case nothing changes.
    pub fn reserve(&mut self, name: &str) -> bool {
        if self.models.contains_key(name) {
            return false;
        }
        debug!("Registering model {}", name);
        self.models.insert(name.to_string(), Model::new(name));
        true
    }

    /// Fills in a reserved model.
    pub fn populate(&mut self, name: &str, description: Option<String>, properties: Vec<Property>) {
        if let Some(model) = self.models.get_mut(name) {
            model.description = description;
            model.properties = properties;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }
}
