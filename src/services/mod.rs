use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QuerySelect, Select};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{AppError, AppResult};

pub mod auth_service;
pub mod category_service;
pub mod favorite_service;
pub mod menu_service;
pub mod notification_service;
pub mod order_service;
pub mod recipe_service;
pub mod restaurant_service;
pub mod review_service;
pub mod search_service;
pub mod user_service;

/// Runs `select` for one page and also returns the unpaged total.
pub(crate) async fn fetch_page<E>(
    select: Select<E>,
    conn: &DatabaseConnection,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<E::Model>, i64)>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let total = select.clone().count(conn).await? as i64;
    let rows = select
        .limit(limit as u64)
        .offset(offset as u64)
        .all(conn)
        .await?;
    Ok((rows, total))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Internal(e.into()))
}
