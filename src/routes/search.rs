use axum::{Router, extract::State, routing::get};

use crate::{
    dto::search::SearchHit,
    error::AppResult,
    extract::{Json, Query},
    response::ApiResponse,
    routes::params::SearchQuery,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}

#[utoipa::path(
    get,
    path = "/api/v1/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Published recipes and restaurants matching `q`", body = ApiResponse<Vec<SearchHit>>),
        (status = 400, description = "Missing search query")
    ),
    tag = "Search"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<SearchHit>>>> {
    let (hits, meta) = search_service::search(&state, query).await?;
    Ok(Json(ApiResponse::success(hits, meta)))
}
