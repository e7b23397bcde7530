use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    dto::users::{AdminUpdateUserRequest, UpdateMeRequest},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::Meta,
    routes::params::{UserQuery, paginate},
    services::{
        auth_service::{active_user, user_from_entity},
        fetch_page,
    },
    state::AppState,
};

async fn ensure_email_free(state: &AppState, email: &str, owner: Uuid) -> AppResult<()> {
    let taken = Users::find()
        .filter(users::Column::Email.eq(email))
        .filter(users::Column::Id.ne(owner))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }
    Ok(())
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<users::Model> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn update_me(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateMeRequest,
) -> AppResult<User> {
    payload.validate()?;
    let user = active_user(&state.orm, auth.user_id).await?;

    let mut model: users::ActiveModel = user.into();
    if let Some(name) = payload.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        ensure_email_free(state, &email, auth.user_id).await?;
        model.email = Set(email);
    }
    model.updated_at = Set(Utc::now().into());
    let user = model.update(&state.orm).await?;
    Ok(user_from_entity(user))
}

/// Soft delete: the row stays for order history, login is refused afterwards.
pub async fn deactivate_me(state: &AppState, auth: &AuthUser) -> AppResult<()> {
    let user = active_user(&state.orm, auth.user_id).await?;
    let mut model: users::ActiveModel = user.into();
    model.active = Set(false);
    model.updated_at = Set(Utc::now().into());
    model.update(&state.orm).await?;

    tracing::info!(user_id = %auth.user_id, "account deactivated");
    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(auth.user_id),
            "user_deactivate",
            "users",
            json!({ "user_id": auth.user_id }),
        ),
    )
    .await;
    Ok(())
}

pub async fn list_users(
    state: &AppState,
    admin: &AuthUser,
    query: UserQuery,
) -> AppResult<(Vec<User>, Meta)> {
    ensure_admin(admin)?;
    let (page, limit, offset) = paginate(query.page, query.limit);

    let mut finder = Users::find();
    if let Some(role) = query.role {
        finder = finder.filter(users::Column::Role.eq(role));
    }
    if let Some(active) = query.active {
        finder = finder.filter(users::Column::Active.eq(active));
    }
    let finder = finder.order_by_desc(users::Column::CreatedAt);

    let (rows, total) = fetch_page(finder, &state.orm, limit, offset).await?;
    let items: Vec<User> = rows.into_iter().map(user_from_entity).collect();
    let meta = Meta::paged(items.len(), total, page, limit);
    Ok((items, meta))
}

pub async fn get_user(state: &AppState, admin: &AuthUser, id: Uuid) -> AppResult<User> {
    ensure_admin(admin)?;
    find_user(state, id).await.map(user_from_entity)
}

pub async fn update_user(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    payload: AdminUpdateUserRequest,
) -> AppResult<User> {
    ensure_admin(admin)?;
    payload.validate()?;
    let user = find_user(state, id).await?;

    let mut model: users::ActiveModel = user.into();
    if let Some(name) = payload.name {
        model.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        ensure_email_free(state, &email, id).await?;
        model.email = Set(email);
    }
    if let Some(role) = payload.role {
        model.role = Set(role);
    }
    if let Some(active) = payload.active {
        model.active = Set(active);
    }
    model.updated_at = Set(Utc::now().into());
    let user = model.update(&state.orm).await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(admin.user_id),
            "user_update",
            "users",
            json!({ "user_id": id, "role": user.role, "active": user.active }),
        ),
    )
    .await;
    Ok(user_from_entity(user))
}

/// Hard delete. Users still referenced by orders or restaurants give a 409.
pub async fn delete_user(state: &AppState, admin: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(admin)?;
    find_user(state, id).await?;
    Users::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(admin.user_id),
            "user_delete",
            "users",
            json!({ "user_id": id }),
        ),
    )
    .await;
    Ok(())
}
