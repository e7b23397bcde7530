use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::reviews::{CreateReviewRequest, UpdateReviewRequest},
    entity::{Reviews, reviews},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin},
    models::{NotificationType, RelatedEntity, RelatedKind, Review},
    rating::RatingAggregate,
    response::Meta,
    routes::params::{ReviewQuery, ReviewSort, paginate},
    services::{
        fetch_page,
        notification_service::{NewNotification, create_notification},
        restaurant_service::{lock_restaurant, store_rating},
    },
    state::AppState,
};

pub fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        restaurant_id: model.restaurant_id,
        rating: model.rating,
        comment: model.comment,
        is_edited: model.is_edited,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub async fn list_reviews(state: &AppState, query: ReviewQuery) -> AppResult<(Vec<Review>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Reviews::find();
    if let Some(restaurant_id) = query.restaurant_id {
        finder = finder.filter(reviews::Column::RestaurantId.eq(restaurant_id));
    }
    if let Some(user_id) = query.user_id {
        finder = finder.filter(reviews::Column::UserId.eq(user_id));
    }
    if let Some(min) = query.min_rating {
        finder = finder.filter(reviews::Column::Rating.gte(min));
    }
    if let Some(max) = query.max_rating {
        finder = finder.filter(reviews::Column::Rating.lte(max));
    }
    finder = match query.sort.unwrap_or(ReviewSort::Newest) {
        ReviewSort::RatingDesc => finder
            .order_by_desc(reviews::Column::Rating)
            .order_by_desc(reviews::Column::CreatedAt),
        ReviewSort::RatingAsc => finder
            .order_by_asc(reviews::Column::Rating)
            .order_by_desc(reviews::Column::CreatedAt),
        ReviewSort::Newest => finder.order_by_desc(reviews::Column::CreatedAt),
    };

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<Review> = rows.into_iter().map(review_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn get_review(state: &AppState, id: Uuid) -> AppResult<Review> {
    Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(review_from_entity)
        .ok_or_else(|| AppError::not_found("Review"))
}

fn already_reviewed() -> AppError {
    AppError::BadRequest("You have already reviewed this restaurant".into())
}

/// The unique (user, restaurant) index surfaces as a Conflict; callers see the
/// same 400 as the explicit pre-check.
fn duplicate_as_bad_request(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => already_reviewed(),
        other => other,
    }
}

/// Inserts the review and folds it into the restaurant aggregate in one
/// transaction, with the restaurant row locked.
pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<Review> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let restaurant = lock_restaurant(&txn, payload.restaurant_id).await?;

    let existing = Reviews::find()
        .filter(reviews::Column::UserId.eq(user.user_id))
        .filter(reviews::Column::RestaurantId.eq(restaurant.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(already_reviewed());
    }

    let review = reviews::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        restaurant_id: Set(restaurant.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        is_edited: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| duplicate_as_bad_request(err.into()))?;

    let owner_id = restaurant.owner_id;
    let restaurant_name = restaurant.name.clone();
    let agg = RatingAggregate::new(restaurant.rating_sum, restaurant.review_count).add(review.rating);
    store_rating(&txn, restaurant, agg).await?;
    txn.commit().await?;

    let notice = NewNotification::new(
        owner_id,
        NotificationType::NewReview,
        "New review",
        format!("{restaurant_name} received a {}-star review.", review.rating),
    )
    .related(RelatedEntity {
        kind: RelatedKind::Review,
        id: review.id,
    })
    .metadata(json!({ "restaurantId": review.restaurant_id, "rating": review.rating }));
    if let Err(err) = create_notification(state, notice).await {
        tracing::warn!(review_id = %review.id, error = %err, "review notification failed");
    }

    Ok(review_from_entity(review))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<Review> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let review = Reviews::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    ensure_owner_or_admin(review.user_id, user)?;

    let old_rating = review.rating;
    let restaurant_id = review.restaurant_id;
    let mut active: reviews::ActiveModel = review.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment);
    }
    active.is_edited = Set(true);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    if updated.rating != old_rating {
        let restaurant = lock_restaurant(&txn, restaurant_id).await?;
        let agg = RatingAggregate::new(restaurant.rating_sum, restaurant.review_count)
            .replace(old_rating, updated.rating);
        store_rating(&txn, restaurant, agg).await?;
    }
    txn.commit().await?;

    Ok(review_from_entity(updated))
}

pub async fn delete_review(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    let review = Reviews::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    ensure_owner_or_admin(review.user_id, user)?;

    let restaurant = lock_restaurant(&txn, review.restaurant_id).await?;
    Reviews::delete_by_id(review.id).exec(&txn).await?;
    let agg = RatingAggregate::new(restaurant.rating_sum, restaurant.review_count)
        .remove(review.rating);
    store_rating(&txn, restaurant, agg).await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_index_conflict_reads_as_duplicate_review() {
        let err = duplicate_as_bad_request(AppError::Conflict("Resource already exists".into()));
        match err {
            AppError::BadRequest(message) => {
                assert_eq!(message, "You have already reviewed this restaurant")
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn other_errors_pass_through() {
        let err = duplicate_as_bad_request(AppError::not_found("Restaurant"));
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
