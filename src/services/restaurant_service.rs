use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType, extension::postgres::PgExpr},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    dto::restaurants::{CreateRestaurantRequest, UpdateRestaurantRequest},
    entity::{Restaurants, Reviews, restaurants, reviews},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{Restaurant, Role},
    rating::RatingAggregate,
    response::Meta,
    routes::params::{RestaurantQuery, RestaurantSortBy, SortOrder, paginate},
    services::fetch_page,
    state::AppState,
};

pub fn restaurant_from_entity(model: restaurants::Model) -> Restaurant {
    Restaurant {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        cuisine: model.cuisine,
        phone: model.phone,
        email: model.email,
        address: model.address,
        delivery_fee: model.delivery_fee,
        minimum_order: model.minimum_order,
        is_open: model.is_open,
        rating: model.rating,
        review_count: model.review_count,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

/// Lowercases, strips everything but word characters, whitespace and dashes,
/// then turns whitespace into single dashes.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for ch in kept.trim().chars() {
        let ch = if ch.is_whitespace() { '-' } else { ch };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug
}

pub(crate) async fn find_restaurant<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<restaurants::Model> {
    Restaurants::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))
}

/// Same as [`find_restaurant`] but holds the row lock until the transaction ends.
pub(crate) async fn lock_restaurant<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<restaurants::Model> {
    Restaurants::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))
}

/// Writes `agg` and the derived average onto the restaurant row.
pub(crate) async fn store_rating<C: ConnectionTrait>(
    conn: &C,
    restaurant: restaurants::Model,
    agg: RatingAggregate,
) -> AppResult<restaurants::Model> {
    let mut active: restaurants::ActiveModel = restaurant.into();
    active.rating_sum = Set(agg.sum);
    active.review_count = Set(agg.count);
    active.rating = Set(agg.average());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

/// Rebuilds the rating from every review of the restaurant.
pub async fn update_restaurant_rating<C: ConnectionTrait>(
    conn: &C,
    restaurant_id: Uuid,
) -> AppResult<restaurants::Model> {
    let restaurant = lock_restaurant(conn, restaurant_id).await?;
    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(reviews::Column::Rating)
        .filter(reviews::Column::RestaurantId.eq(restaurant_id))
        .into_tuple()
        .all(conn)
        .await?;
    let agg = RatingAggregate::from_ratings(ratings);
    tracing::debug!(%restaurant_id, count = agg.count, rating = agg.average(), "rating recomputed");
    store_rating(conn, restaurant, agg).await
}

pub async fn recompute_rating(
    state: &AppState,
    user: &AuthUser,
    restaurant_id: Uuid,
) -> AppResult<Restaurant> {
    let restaurant = find_restaurant(&state.orm, restaurant_id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;
    let txn = state.orm.begin().await?;
    let updated = update_restaurant_rating(&txn, restaurant_id).await?;
    txn.commit().await?;
    Ok(restaurant_from_entity(updated))
}

pub async fn list_restaurants(
    state: &AppState,
    query: RestaurantQuery,
) -> AppResult<(Vec<Restaurant>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Restaurants::find();
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        finder = finder.filter(Expr::col(restaurants::Column::Name).ilike(format!("%{q}%")));
    }
    if let Some(cuisine) = query.cuisine.as_deref().filter(|c| !c.is_empty()) {
        finder = finder.filter(restaurants::Column::Cuisine.eq(cuisine));
    }
    if let Some(is_open) = query.is_open {
        finder = finder.filter(restaurants::Column::IsOpen.eq(is_open));
    }

    let column = match query.sort_by.unwrap_or(RestaurantSortBy::CreatedAt) {
        RestaurantSortBy::CreatedAt => restaurants::Column::CreatedAt,
        RestaurantSortBy::Rating => restaurants::Column::Rating,
        RestaurantSortBy::Name => restaurants::Column::Name,
    };
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<Restaurant> = rows.into_iter().map(restaurant_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn get_restaurant(state: &AppState, id: Uuid) -> AppResult<Restaurant> {
    find_restaurant(&state.orm, id)
        .await
        .map(restaurant_from_entity)
}

/// Restaurants owned by `owner_id`. Only that owner or an admin may list them.
pub async fn list_owner_restaurants(
    state: &AppState,
    user: &AuthUser,
    owner_id: Uuid,
) -> AppResult<Vec<Restaurant>> {
    ensure_owner_or_admin(owner_id, user)?;
    let rows = Restaurants::find()
        .filter(restaurants::Column::OwnerId.eq(owner_id))
        .order_by_desc(restaurants::Column::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(rows.into_iter().map(restaurant_from_entity).collect())
}

pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: CreateRestaurantRequest,
) -> AppResult<Restaurant> {
    if !matches!(user.role, Role::RestaurantOwner | Role::Admin) {
        return Err(AppError::forbidden(
            "Only restaurant owners can create restaurants",
        ));
    }
    payload.validate()?;

    let restaurant = restaurants::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        slug: Set(slugify(&payload.name)),
        name: Set(payload.name),
        description: Set(payload.description),
        cuisine: Set(payload.cuisine),
        phone: Set(payload.phone),
        email: Set(payload.email),
        address: Set(payload.address),
        delivery_fee: Set(payload.delivery_fee.unwrap_or(0)),
        minimum_order: Set(payload.minimum_order.unwrap_or(0)),
        is_open: Set(payload.is_open.unwrap_or(true)),
        rating: Set(0.0),
        rating_sum: Set(0),
        review_count: Set(0),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(user.user_id),
            "restaurant_create",
            "restaurants",
            json!({ "restaurant_id": restaurant.id }),
        ),
    )
    .await;

    Ok(restaurant_from_entity(restaurant))
}

pub async fn update_restaurant(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRestaurantRequest,
) -> AppResult<Restaurant> {
    payload.validate()?;
    let restaurant = find_restaurant(&state.orm, id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;

    let mut active: restaurants::ActiveModel = restaurant.into();
    if let Some(name) = payload.name {
        active.slug = Set(slugify(&name));
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(cuisine) = payload.cuisine {
        active.cuisine = Set(Some(cuisine));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(fee) = payload.delivery_fee {
        active.delivery_fee = Set(fee);
    }
    if let Some(minimum) = payload.minimum_order {
        active.minimum_order = Set(minimum);
    }
    if let Some(is_open) = payload.is_open {
        active.is_open = Set(is_open);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;
    Ok(restaurant_from_entity(updated))
}

pub async fn delete_restaurant(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let restaurant = find_restaurant(&state.orm, id).await?;
    ensure_owner_or_admin(restaurant.owner_id, user)?;
    Restaurants::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(user.user_id),
            "restaurant_delete",
            "restaurants",
            json!({ "restaurant_id": id }),
        ),
    )
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("Mama's Pizza"), "mamas-pizza");
        assert_eq!(slugify("Mama's  Pizza & Pasta!"), "mamas-pizza-pasta");
        assert_eq!(slugify("  Sushi Bar  "), "sushi-bar");
        assert_eq!(slugify("Café 42"), "caf-42");
        assert_eq!(slugify("Fish - Chips"), "fish-chips");
    }

    #[test]
    fn slugify_keeps_underscores() {
        assert_eq!(slugify("big_bite grill"), "big_bite-grill");
    }
}
