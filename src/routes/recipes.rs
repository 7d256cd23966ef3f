use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{error::ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Upstream bodies are relayed byte for byte.
fn json_body(body: Bytes) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

/// GET /api/recipes/search?q=...
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(params) = params?;
    state.recipes.search(&params.q).await.map(json_body)
}

/// GET /api/recipes/{id}
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.recipes.information(&id).await.map(json_body)
}
