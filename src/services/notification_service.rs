use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::notifications::{NewNotificationEvent, SendNotificationRequest},
    entity::{Notifications, Users, notifications},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Notification, NotificationType, RelatedEntity},
    realtime::user_room,
    response::Meta,
    routes::params::{NotificationQuery, paginate},
    services::fetch_page,
    state::AppState,
};

pub const NEW_NOTIFICATION_EVENT: &str = "newNotification";

/// Everything needed to create one notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedEntity>,
    pub metadata: Option<Value>,
    pub expires_in_days: Option<i64>,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            related: None,
            metadata: None,
            expires_in_days: None,
        }
    }

    pub fn related(mut self, related: RelatedEntity) -> Self {
        self.related = Some(related);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub fn notification_from_entity(model: notifications::Model) -> Notification {
    let related_entity = match (model.related_kind, model.related_id) {
        (Some(kind), Some(id)) => Some(RelatedEntity { kind, id }),
        _ => None,
    };
    Notification {
        id: model.id,
        user_id: model.user_id,
        kind: model.kind,
        title: model.title,
        message: model.message,
        is_read: model.is_read,
        read_at: model.read_at.map(|at| at.with_timezone(&Utc)),
        related_entity,
        metadata: model.metadata,
        expires_at: model.expires_at.map(|at| at.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn not_expired() -> Condition {
    Condition::any()
        .add(notifications::Column::ExpiresAt.is_null())
        .add(notifications::Column::ExpiresAt.gt(Utc::now()))
}

/// Unread, unexpired notifications of `user_id`.
pub async fn unread_count_for<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<u64> {
    let count = Notifications::find()
        .filter(notifications::Column::UserId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .filter(not_expired())
        .count(conn)
        .await?;
    Ok(count)
}

/// Persists the notification, then pushes it with the fresh unread count to
/// the user's room. The count is read after the insert, so it includes it.
pub async fn create_notification(
    state: &AppState,
    new: NewNotification,
) -> AppResult<Notification> {
    let expires_at = new
        .expires_in_days
        .map(|days| (Utc::now() + chrono::Duration::days(days)).into());

    let model = notifications::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        kind: Set(new.kind),
        title: Set(new.title),
        message: Set(new.message),
        is_read: Set(false),
        read_at: Set(None),
        related_kind: Set(new.related.as_ref().map(|r| r.kind)),
        related_id: Set(new.related.as_ref().map(|r| r.id)),
        metadata: Set(new.metadata),
        expires_at: Set(expires_at),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    let notification = notification_from_entity(model);
    let unread_count = unread_count_for(&state.orm, new.user_id).await?;

    state.hub.emit(
        &user_room(new.user_id),
        NEW_NOTIFICATION_EVENT,
        NewNotificationEvent {
            notification: notification.clone(),
            unread_count,
        },
    )?;

    Ok(notification)
}

pub async fn list_notifications(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<(Vec<Notification>, Meta)> {
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Notifications::find()
        .filter(notifications::Column::UserId.eq(user.user_id))
        .filter(not_expired());
    if let Some(kind) = query.kind {
        finder = finder.filter(notifications::Column::Kind.eq(kind));
    }
    if let Some(is_read) = query.is_read {
        finder = finder.filter(notifications::Column::IsRead.eq(is_read));
    }
    let finder = finder.order_by_desc(notifications::Column::CreatedAt);

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<Notification> = rows.into_iter().map(notification_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn unread_count(state: &AppState, user: &AuthUser) -> AppResult<u64> {
    unread_count_for(&state.orm, user.user_id).await
}

/// Expired rows count as gone even before the sweeper deletes them.
async fn owned_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<notifications::Model> {
    let notification = Notifications::find_by_id(id)
        .filter(not_expired())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Notification"))?;
    if notification.user_id != user.user_id {
        return Err(AppError::forbidden(
            "You do not have permission to access this notification",
        ));
    }
    Ok(notification)
}

pub async fn mark_as_read(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Notification> {
    let notification = owned_notification(state, user, id).await?;
    if notification.is_read {
        return Ok(notification_from_entity(notification));
    }

    let mut active: notifications::ActiveModel = notification.into();
    active.is_read = Set(true);
    let updated = active.update(&state.orm).await?;
    Ok(notification_from_entity(updated))
}

/// Marks every unread notification of the user as read. Returns how many changed.
pub async fn mark_all_as_read(state: &AppState, user: &AuthUser) -> AppResult<u64> {
    let now = Utc::now();
    let result = Notifications::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .col_expr(notifications::Column::ReadAt, Expr::value(now))
        .col_expr(notifications::Column::UpdatedAt, Expr::value(now))
        .filter(notifications::Column::UserId.eq(user.user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .filter(not_expired())
        .exec(&state.orm)
        .await?;
    tracing::debug!(user_id = %user.user_id, updated = result.rows_affected, "marked all read");
    Ok(result.rows_affected)
}

pub async fn delete_notification(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    owned_notification(state, user, id).await?;
    Notifications::delete_by_id(id).exec(&state.orm).await?;
    Ok(())
}

/// Admin-only delivery of system or promotional messages.
pub async fn send_notification(
    state: &AppState,
    admin: &AuthUser,
    payload: SendNotificationRequest,
) -> AppResult<Notification> {
    ensure_admin(admin)?;
    payload.validate()?;

    Users::find_by_id(payload.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    create_notification(
        state,
        NewNotification {
            user_id: payload.user_id,
            kind: payload.kind,
            title: payload.title,
            message: payload.message,
            related: payload.related_entity,
            metadata: payload.metadata,
            expires_in_days: payload.expires_in_days,
        },
    )
    .await
}
