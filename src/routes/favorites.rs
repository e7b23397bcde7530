use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};

use uuid::Uuid;

use crate::{
    dto::favorites::{AddFavoriteRequest, FavoriteCheck},
    error::AppResult,
    extract::{Json, Path, Query},
    middleware::auth::AuthUser,
    models::{Favorite, FavoriteType},
    response::ApiResponse,
    routes::params::FavoriteQuery,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/check/{item_type}/{item_id}", get(check_favorite))
        .route("/{id}", delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    params(FavoriteQuery),
    responses((status = 200, description = "Caller's favorites", body = ApiResponse<Vec<Favorite>>)),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FavoriteQuery>,
) -> AppResult<Json<ApiResponse<Vec<Favorite>>>> {
    let (items, meta) = favorite_service::list_favorites(&state, &user, query).await?;
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 201, description = "Favorite added", body = ApiResponse<Favorite>),
        (status = 400, description = "Already a favorite"),
        (status = 404, description = "Item does not exist")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddFavoriteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Favorite>>)> {
    let favorite = favorite_service::add_favorite(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(favorite))))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites/check/{item_type}/{item_id}",
    params(
        ("item_type" = FavoriteType, Path, description = "recipe, restaurant or menu"),
        ("item_id" = Uuid, Path, description = "Item id")
    ),
    responses((status = 200, description = "Whether the caller favorited the item", body = ApiResponse<FavoriteCheck>)),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn check_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path((item_type, item_id)): Path<(FavoriteType, Uuid)>,
) -> AppResult<Json<ApiResponse<FavoriteCheck>>> {
    let favorited = favorite_service::is_favorited(&state, &user, item_type, item_id).await?;
    Ok(Json(ApiResponse::data(FavoriteCheck { favorited })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/favorites/{id}",
    params(("id" = Uuid, Path, description = "Favorite id")),
    responses(
        (status = 204, description = "Favorite removed"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    favorite_service::remove_favorite(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
