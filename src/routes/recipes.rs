use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use uuid::Uuid;

use crate::{
    dto::recipes::{CreateRecipeRequest, UpdateRecipeRequest},
    error::AppResult,
    extract::{Json, Path, Query},
    middleware::auth::{AuthUser, MaybeAuthUser},
    models::Recipe,
    response::ApiResponse,
    routes::params::RecipeQuery,
    services::recipe_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route(
            "/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/recipes",
    params(RecipeQuery),
    responses((status = 200, description = "Published recipes plus the caller's drafts", body = ApiResponse<Vec<Recipe>>)),
    tag = "Recipes"
)]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<RecipeQuery>,
) -> AppResult<Json<ApiResponse<Vec<Recipe>>>> {
    let (items, meta) = recipe_service::list_recipes(&state, viewer.as_ref(), query).await?;
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = ApiResponse<Recipe>),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateRecipeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Recipe>>)> {
    let recipe = recipe_service::create_recipe(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(recipe))))
}

#[utoipa::path(
    get,
    path = "/api/v1/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe id")),
    responses(
        (status = 200, description = "Recipe", body = ApiResponse<Recipe>),
        (status = 404, description = "Not found or not visible")
    ),
    tag = "Recipes"
)]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let recipe = recipe_service::get_recipe(&state, viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::data(recipe)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe id")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = ApiResponse<Recipe>),
        (status = 403, description = "Not the author")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> AppResult<Json<ApiResponse<Recipe>>> {
    let recipe = recipe_service::update_recipe(&state, &user, id, payload).await?;
    Ok(Json(ApiResponse::data(recipe)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/recipes/{id}",
    params(("id" = Uuid, Path, description = "Recipe id")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author")
    ),
    security(("bearer_auth" = [])),
    tag = "Recipes"
)]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    recipe_service::delete_recipe(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
