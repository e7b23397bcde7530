use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Notification, NotificationType, RelatedEntity};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendNotificationRequest {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 500, message = "Message is required"))]
    pub message: String,
    pub related_entity: Option<RelatedEntity>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    #[validate(range(min = 1, max = 365))]
    pub expires_in_days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: u64,
}

/// Payload of the `newNotification` room event.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewNotificationEvent {
    pub notification: Notification,
    pub unread_count: u64,
}
