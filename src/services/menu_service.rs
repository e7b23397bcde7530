use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::menu::{CreateMenuItemRequest, UpdateMenuItemRequest},
    entity::{MenuItems, menu_items},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::MenuItem,
    services::restaurant_service::find_restaurant,
    state::AppState,
};

pub fn menu_item_from_entity(model: menu_items::Model) -> MenuItem {
    MenuItem {
        id: model.id,
        restaurant_id: model.restaurant_id,
        name: model.name,
        description: model.description,
        price: model.price,
        category: model.category,
        is_available: model.is_available,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

async fn find_menu_item(state: &AppState, id: Uuid) -> AppResult<menu_items::Model> {
    MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Menu item"))
}

/// Loads the item and checks the caller owns its restaurant.
async fn owned_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<menu_items::Model> {
    let item = find_menu_item(state, id).await?;
    let restaurant = find_restaurant(&state.orm, item.restaurant_id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;
    Ok(item)
}

pub async fn list_menu(state: &AppState, restaurant_id: Uuid) -> AppResult<Vec<MenuItem>> {
    find_restaurant(&state.orm, restaurant_id).await?;
    let items = MenuItems::find()
        .filter(menu_items::Column::RestaurantId.eq(restaurant_id))
        .order_by_asc(menu_items::Column::Category)
        .order_by_asc(menu_items::Column::Name)
        .all(&state.orm)
        .await?;
    Ok(items.into_iter().map(menu_item_from_entity).collect())
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<MenuItem> {
    find_menu_item(state, id).await.map(menu_item_from_entity)
}

pub async fn create_menu_item(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
    payload: CreateMenuItemRequest,
) -> AppResult<MenuItem> {
    payload.validate()?;
    let restaurant = find_restaurant(&state.orm, restaurant_id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;

    let item = menu_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(restaurant_id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        category: Set(payload.category),
        is_available: Set(payload.is_available.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    Ok(menu_item_from_entity(item))
}

pub async fn update_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<MenuItem> {
    payload.validate()?;
    let item = owned_menu_item(state, user, id).await?;

    let mut active: menu_items::ActiveModel = item.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(Some(category));
    }
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;
    Ok(menu_item_from_entity(updated))
}

pub async fn delete_menu_item(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    owned_menu_item(state, user, id).await?;
    MenuItems::delete_by_id(id).exec(&state.orm).await?;
    Ok(())
}
