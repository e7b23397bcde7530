use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::FavoriteType;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFavoriteRequest {
    #[serde(rename = "type")]
    pub item_type: FavoriteType,
    pub item_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoriteCheck {
    pub favorited: bool,
}
