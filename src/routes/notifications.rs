use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch},
};

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::notifications::{SendNotificationRequest, UnreadCount},
    error::AppResult,
    extract::{Json, Path, Query},
    middleware::auth::AuthUser,
    models::Notification,
    response::ApiResponse,
    routes::params::NotificationQuery,
    services::notification_service,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedRead {
    pub updated: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(send_notification))
        .route("/unread-count", get(unread_count))
        .route("/read-all", patch(mark_all_as_read))
        .route("/{id}/read", patch(mark_as_read))
        .route("/{id}", delete(delete_notification))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(NotificationQuery),
    responses((status = 200, description = "Caller's notifications, newest first", body = ApiResponse<Vec<Notification>>)),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let (items, meta) = notification_service::list_notifications(&state, &user, query).await?;
    Ok(Json(ApiResponse::success(items, meta)))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification sent", body = ApiResponse<Notification>),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn send_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SendNotificationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Notification>>)> {
    let notification = notification_service::send_notification(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(notification))))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses((status = 200, description = "Unread notification count", body = ApiResponse<UnreadCount>)),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let count = notification_service::unread_count(&state, &user).await?;
    Ok(Json(ApiResponse::data(UnreadCount { count })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/read-all",
    responses((status = 200, description = "All notifications marked read", body = ApiResponse<MarkedRead>)),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MarkedRead>>> {
    let updated = notification_service::mark_all_as_read(&state, &user).await?;
    Ok(Json(ApiResponse::data(MarkedRead { updated })))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<Notification>),
        (status = 403, description = "Not the recipient")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn mark_as_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_as_read(&state, &user, id).await?;
    Ok(Json(ApiResponse::data(notification)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 403, description = "Not the recipient")
    ),
    security(("bearer_auth" = [])),
    tag = "Notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    notification_service::delete_notification(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
