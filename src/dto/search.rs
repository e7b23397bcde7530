use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchHitType {
    Recipe,
    Restaurant,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: SearchHitType,
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
}
