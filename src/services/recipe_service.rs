use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::recipes::{CreateRecipeRequest, UpdateRecipeRequest},
    entity::{Recipes, recipes},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::Recipe,
    response::Meta,
    routes::params::{RecipeQuery, paginate},
    services::{fetch_page, from_json, to_json},
    state::AppState,
};

pub fn recipe_from_entity(model: recipes::Model) -> AppResult<Recipe> {
    Ok(Recipe {
        id: model.id,
        author_id: model.author_id,
        title: model.title,
        description: model.description,
        ingredients: from_json(model.ingredients)?,
        instructions: from_json(model.instructions)?,
        prep_time_minutes: model.prep_time_minutes,
        cook_time_minutes: model.cook_time_minutes,
        servings: model.servings,
        difficulty: model.difficulty,
        cuisine: model.cuisine,
        is_published: model.is_published,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn can_see(recipe: &recipes::Model, viewer: Option<&AuthUser>) -> bool {
    recipe.is_published
        || viewer.is_some_and(|user| user.is_admin() || user.user_id == recipe.author_id)
}

async fn find_recipe(state: &AppState, id: Uuid) -> AppResult<recipes::Model> {
    Recipes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))
}

/// Published recipes, plus the viewer's own drafts. Admins see all.
pub async fn list_recipes(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: RecipeQuery,
) -> AppResult<(Vec<Recipe>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Recipes::find();
    match viewer {
        Some(user) if user.is_admin() => {}
        Some(user) => {
            finder = finder.filter(
                Condition::any()
                    .add(recipes::Column::IsPublished.eq(true))
                    .add(recipes::Column::AuthorId.eq(user.user_id)),
            );
        }
        None => finder = finder.filter(recipes::Column::IsPublished.eq(true)),
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        finder = finder.filter(Expr::col(recipes::Column::Title).ilike(format!("%{q}%")));
    }
    if let Some(difficulty) = query.difficulty {
        finder = finder.filter(recipes::Column::Difficulty.eq(difficulty));
    }
    if let Some(cuisine) = query.cuisine.as_deref().filter(|c| !c.is_empty()) {
        finder = finder.filter(recipes::Column::Cuisine.eq(cuisine));
    }
    let finder = finder.order_by_desc(recipes::Column::CreatedAt);

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items = rows
        .into_iter()
        .map(recipe_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn get_recipe(state: &AppState, viewer: Option<&AuthUser>, id: Uuid) -> AppResult<Recipe> {
    let recipe = find_recipe(state, id).await?;
    if !can_see(&recipe, viewer) {
        return Err(AppError::not_found("Recipe"));
    }
    recipe_from_entity(recipe)
}

pub async fn create_recipe(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRecipeRequest,
) -> AppResult<Recipe> {
    payload.validate()?;

    let recipe = recipes::ActiveModel {
        id: Set(Uuid::new_v4()),
        author_id: Set(user.user_id),
        title: Set(payload.title),
        description: Set(payload.description),
        ingredients: Set(to_json(&payload.ingredients)?),
        instructions: Set(to_json(&payload.instructions)?),
        prep_time_minutes: Set(payload.prep_time_minutes),
        cook_time_minutes: Set(payload.cook_time_minutes),
        servings: Set(payload.servings),
        difficulty: Set(payload.difficulty),
        cuisine: Set(payload.cuisine),
        is_published: Set(payload.is_published.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    recipe_from_entity(recipe)
}

pub async fn update_recipe(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRecipeRequest,
) -> AppResult<Recipe> {
    payload.validate()?;
    let recipe = find_recipe(state, id).await?;
    ensure_owner_or_admin(recipe.author_id, user)?;

    let mut active: recipes::ActiveModel = recipe.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(ingredients) = payload.ingredients {
        active.ingredients = Set(to_json(&ingredients)?);
    }
    if let Some(instructions) = payload.instructions {
        active.instructions = Set(to_json(&instructions)?);
    }
    if let Some(prep) = payload.prep_time_minutes {
        active.prep_time_minutes = Set(prep);
    }
    if let Some(cook) = payload.cook_time_minutes {
        active.cook_time_minutes = Set(cook);
    }
    if let Some(servings) = payload.servings {
        active.servings = Set(servings);
    }
    if let Some(difficulty) = payload.difficulty {
        active.difficulty = Set(difficulty);
    }
    if let Some(cuisine) = payload.cuisine {
        active.cuisine = Set(Some(cuisine));
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;
    recipe_from_entity(updated)
}

pub async fn delete_recipe(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let recipe = find_recipe(state, id).await?;
    ensure_owner_or_admin(recipe.author_id, user)?;
    Recipes::delete_by_id(id).exec(&state.orm).await?;
    Ok(())
}
