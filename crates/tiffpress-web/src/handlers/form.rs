use axum::{extract::State, response::Html};

use crate::html;
use crate::state::AppState;

/// GET / - the upload form, pre-filled with the configured dimensions.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let config = &state.config;
    Html(html::index_page(config.default_width, config.default_height).into_string())
}
