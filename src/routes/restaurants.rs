use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use uuid::Uuid;

use crate::{
    dto::{
        menu::CreateMenuItemRequest,
        restaurants::{CreateRestaurantRequest, UpdateRestaurantRequest},
    },
    error::AppResult,
    extract::{Json, Path, Query},
    middleware::auth::AuthUser,
    models::{MenuItem, Order, Restaurant},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, RestaurantQuery},
    services::{menu_service, order_service, restaurant_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants).post(create_restaurant))
        .route(
            "/{id}",
            get(get_restaurant)
                .patch(update_restaurant)
                .delete(delete_restaurant),
        )
        .route("/{id}/menu", get(list_menu).post(create_menu_item))
        .route("/{id}/orders", get(list_restaurant_orders))
        .route("/{id}/rating/recompute", post(recompute_rating))
        .route("/owner/{owner_id}", get(list_owner_restaurants))
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants",
    params(RestaurantQuery),
    responses((status = 200, description = "List restaurants", body = ApiResponse<Vec<Restaurant>>)),
    tag = "Restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(query): Query<RestaurantQuery>,
) -> AppResult<Json<ApiResponse<Vec<Restaurant>>>> {
    let (items, meta) = restaurant_service::list_restaurants(&state, query).await?;
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/owner/{owner_id}",
    params(("owner_id" = Uuid, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Restaurants of the owner", body = ApiResponse<Vec<Restaurant>>),
        (status = 403, description = "Neither that owner nor an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn list_owner_restaurants(
    State(state): State<AppState>,
    user: AuthUser,
    Path(owner_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Restaurant>>>> {
    let items = restaurant_service::list_owner_restaurants(&state, &user, owner_id).await?;
    let meta = Meta::results(items.len());
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created", body = ApiResponse<Restaurant>),
        (status = 403, description = "Caller is not a restaurant owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Restaurant>>)> {
    let restaurant = restaurant_service::create_restaurant(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(restaurant))))
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant", body = ApiResponse<Restaurant>),
        (status = 404, description = "Not found")
    ),
    tag = "Restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let restaurant = restaurant_service::get_restaurant(&state, id).await?;
    Ok(Json(ApiResponse::data(restaurant)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant updated", body = ApiResponse<Restaurant>),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let restaurant = restaurant_service::update_restaurant(&state, &user, id, payload).await?;
    Ok(Json(ApiResponse::data(restaurant)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/restaurants/{id}",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 204, description = "Restaurant deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    restaurant_service::delete_restaurant(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/menu",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses((status = 200, description = "Menu of the restaurant", body = ApiResponse<Vec<MenuItem>>)),
    tag = "Menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<MenuItem>>>> {
    let items = menu_service::list_menu(&state, id).await?;
    let meta = Meta::results(items.len());
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/menu",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = ApiResponse<MenuItem>),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    let item = menu_service::create_menu_item(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/restaurants/{id}/orders",
    params(("id" = Uuid, Path, description = "Restaurant id"), OrderListQuery),
    responses(
        (status = 200, description = "Orders placed with the restaurant", body = ApiResponse<Vec<Order>>),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let (items, meta) = order_service::list_restaurant_orders(&state, &user, id, query).await?;
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/restaurants/{id}/rating/recompute",
    params(("id" = Uuid, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Rating rebuilt from all reviews", body = ApiResponse<Restaurant>),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Restaurants"
)]
pub async fn recompute_rating(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let restaurant = restaurant_service::recompute_rating(&state, &user, id).await?;
    Ok(Json(ApiResponse::data(restaurant)))
}
