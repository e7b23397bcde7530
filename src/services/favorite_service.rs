use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::favorites::AddFavoriteRequest,
    entity::{Favorites, MenuItems, Recipes, Restaurants, favorites},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Favorite, FavoriteType},
    response::Meta,
    routes::params::{FavoriteQuery, paginate},
    services::fetch_page,
    state::AppState,
};

pub fn favorite_from_entity(model: favorites::Model) -> Favorite {
    Favorite {
        id: model.id,
        user_id: model.user_id,
        item_type: model.item_type,
        item_id: model.item_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

async fn ensure_item_exists(state: &AppState, item_type: FavoriteType, item_id: Uuid) -> AppResult<()> {
    let exists = match item_type {
        FavoriteType::Recipe => Recipes::find_by_id(item_id).count(&state.orm).await? > 0,
        FavoriteType::Restaurant => Restaurants::find_by_id(item_id).count(&state.orm).await? > 0,
        FavoriteType::Menu => MenuItems::find_by_id(item_id).count(&state.orm).await? > 0,
    };
    if !exists {
        let what = match item_type {
            FavoriteType::Recipe => "Recipe",
            FavoriteType::Restaurant => "Restaurant",
            FavoriteType::Menu => "Menu item",
        };
        return Err(AppError::not_found(what));
    }
    Ok(())
}

async fn find_existing(
    state: &AppState,
    user_id: Uuid,
    item_type: FavoriteType,
    item_id: Uuid,
) -> AppResult<Option<favorites::Model>> {
    Ok(Favorites::find()
        .filter(favorites::Column::UserId.eq(user_id))
        .filter(favorites::Column::ItemType.eq(item_type))
        .filter(favorites::Column::ItemId.eq(item_id))
        .one(&state.orm)
        .await?)
}

pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<Favorite> {
    ensure_item_exists(state, payload.item_type, payload.item_id).await?;

    if find_existing(state, user.user_id, payload.item_type, payload.item_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Item is already in favorites".into()));
    }

    let favorite = favorites::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        item_type: Set(payload.item_type),
        item_id: Set(payload.item_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::BadRequest("Item is already in favorites".into()),
        other => other,
    })?;

    Ok(favorite_from_entity(favorite))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    query: FavoriteQuery,
) -> AppResult<(Vec<Favorite>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);
    let mut finder = Favorites::find().filter(favorites::Column::UserId.eq(user.user_id));
    if let Some(item_type) = query.item_type {
        finder = finder.filter(favorites::Column::ItemType.eq(item_type));
    }
    let finder = finder.order_by_desc(favorites::Column::CreatedAt);

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<Favorite> = rows.into_iter().map(favorite_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn is_favorited(
    state: &AppState,
    user: &AuthUser,
    item_type: FavoriteType,
    item_id: Uuid,
) -> AppResult<bool> {
    Ok(find_existing(state, user.user_id, item_type, item_id)
        .await?
        .is_some())
}

pub async fn remove_favorite(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let favorite = Favorites::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Favorite"))?;
    if favorite.user_id != user.user_id {
        return Err(AppError::forbidden(
            "You do not have permission to remove this favorite",
        ));
    }
    Favorites::delete_by_id(id).exec(&state.orm).await?;
    Ok(())
}
