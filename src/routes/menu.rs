use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use uuid::Uuid;

use crate::{
    dto::menu::UpdateMenuItemRequest,
    error::AppResult,
    extract::{Json, Path},
    middleware::auth::AuthUser,
    models::MenuItem,
    response::ApiResponse,
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(get_menu_item)
            .patch(update_menu_item)
            .delete(delete_menu_item),
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 200, description = "Menu item", body = ApiResponse<MenuItem>),
        (status = 404, description = "Not found")
    ),
    tag = "Menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = menu_service::get_menu_item(&state, id).await?;
    Ok(Json(ApiResponse::data(item)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItem>),
        (status = 403, description = "Not the restaurant owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let item = menu_service::update_menu_item(&state, &user, id, payload).await?;
    Ok(Json(ApiResponse::data(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menu-items/{id}",
    params(("id" = Uuid, Path, description = "Menu item id")),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 403, description = "Not the restaurant owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    menu_service::delete_menu_item(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
