use food_platform_api::{
    dto::{
        favorites::AddFavoriteRequest,
        reviews::{CreateReviewRequest, UpdateReviewRequest},
    },
    entity::{Favorites, favorites},
    error::AppError,
    models::{FavoriteType, Role},
    services::{favorite_service, restaurant_service, review_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

mod common;

fn review(restaurant_id: Uuid, rating: i32) -> CreateReviewRequest {
    CreateReviewRequest {
        restaurant_id,
        rating,
        comment: format!("Rated {rating} stars after a proper dinner."),
    }
}

#[tokio::test]
async fn rating_aggregate_follows_reviews() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let owner = common::create_user(&state, Role::RestaurantOwner).await?;
    let restaurant = common::create_restaurant(&state, &owner, 0, 0).await?;

    let mut reviews = Vec::new();
    for rating in [3, 4, 5] {
        let customer = common::create_user(&state, Role::Customer).await?;
        let created = review_service::create_review(&state, &customer, review(restaurant.id, rating)).await?;
        reviews.push((customer, created));
    }

    let current = restaurant_service::get_restaurant(&state, restaurant.id).await?;
    assert_eq!(current.review_count, 3);
    assert_eq!(current.rating, 4.0);

    let (first_author, first) = &reviews[0];
    let duplicate = review_service::create_review(&state, first_author, review(restaurant.id, 1)).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let (five_author, five) = &reviews[2];
    review_service::delete_review(&state, five_author, five.id).await?;
    let current = restaurant_service::get_restaurant(&state, restaurant.id).await?;
    assert_eq!(current.review_count, 2);
    assert_eq!(current.rating, 3.5);

    let recomputed = restaurant_service::recompute_rating(&state, &owner, restaurant.id).await?;
    assert_eq!(recomputed.review_count, 2);
    assert_eq!(recomputed.rating, 3.5);

    let edited = review_service::update_review(
        &state,
        first_author,
        first.id,
        UpdateReviewRequest {
            rating: Some(5),
            ..Default::default()
        },
    )
    .await?;
    assert!(edited.is_edited);
    let current = restaurant_service::get_restaurant(&state, restaurant.id).await?;
    assert_eq!(current.review_count, 2);
    assert_eq!(current.rating, 4.5);

    let stranger = common::create_user(&state, Role::Customer).await?;
    let denied = review_service::delete_review(&state, &stranger, first.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    Ok(())
}

#[tokio::test]
async fn favorites_are_unique_per_item() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let owner = common::create_user(&state, Role::RestaurantOwner).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let restaurant = common::create_restaurant(&state, &owner, 0, 0).await?;

    let request = || AddFavoriteRequest {
        item_type: FavoriteType::Restaurant,
        item_id: restaurant.id,
    };
    let favorite = favorite_service::add_favorite(&state, &customer, request()).await?;
    let duplicate = favorite_service::add_favorite(&state, &customer, request()).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let rows = Favorites::find()
        .filter(favorites::Column::UserId.eq(customer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);
    assert!(
        favorite_service::is_favorited(&state, &customer, FavoriteType::Restaurant, restaurant.id).await?
    );

    let missing = favorite_service::add_favorite(
        &state,
        &customer,
        AddFavoriteRequest {
            item_type: FavoriteType::Restaurant,
            item_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let denied = favorite_service::remove_favorite(&state, &owner, favorite.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    favorite_service::remove_favorite(&state, &customer, favorite.id).await?;
    assert!(
        !favorite_service::is_favorited(&state, &customer, FavoriteType::Restaurant, restaurant.id).await?
    );
    Ok(())
}
