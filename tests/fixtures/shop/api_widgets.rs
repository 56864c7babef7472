use crate::models::{ApiError, NewWidget, Widget};

/// @Title Get widget
/// @Description Looks a single widget up by id.
/// @Param id path i64 true "Widget id"
/// @Success 200 {object} Widget
/// @Failure 404 {object} ApiError "No such widget"
/// @Router /widgets/{id} [get]
pub async fn get_widget(id: i64) -> Result<Widget, ApiError> {
    Err(ApiError::not_found(id))
}

/// @Title List widgets
/// @Param owner query NullString false "Filter by owner name"
/// @Success 200 {array} Widget
/// @Router /widgets [get]
pub async fn list_widgets() -> Vec<Widget> {
    Vec::new()
}

/// @Title Create widget
/// @Accept json
/// @Param body body NewWidget true
/// @Success 201 {object} Widget "Created"
/// @Failure 400 {object} ApiError
/// @Router /widgets [post]
pub async fn create_widget(body: NewWidget) -> Result<Widget, ApiError> {
    Err(ApiError::invalid(&body.display_name))
}

/// Cache key for a widget; not an endpoint.
pub fn widget_cache_key(id: i64) -> String {
    format!("widget:{}", id)
}
