use serde::{Deserialize, Serialize};

/// A widget in the catalogue.
#[derive(Debug, Serialize)]
pub struct Widget {
    /// Unique id
    pub id: i64,
    pub name: String,
    pub tags: Vec<String>,
    pub owner: Option<Person>,
    internal_revision: u32,
}

#[derive(Debug, Serialize)]
pub struct Person {
    pub name: String,
    pub manager: Option<Box<Person>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWidget {
    pub display_name: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn not_found(id: i64) -> Self {
        Self {
            code: 404,
            message: format!("widget {} not found", id),
        }
    }

    pub fn invalid(name: &str) -> Self {
        Self {
            code: 400,
            message: format!("invalid widget name `{}`", name),
        }
    }
}
