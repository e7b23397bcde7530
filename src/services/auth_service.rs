use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{self, AuditEntry},
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    state::AppState,
};

pub fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        role: model.role,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn issue_token(config: &AppConfig, user_id: Uuid, role: Role) -> AppResult<String> {
    let ttl = chrono::Duration::from_std(config.jwt_expires_in)
        .map_err(|e| AppError::Internal(e.into()))?;
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<User> {
    payload.validate()?;
    let role = payload.role.unwrap_or(Role::Customer);
    if role == Role::Admin {
        return Err(AppError::forbidden("The admin role cannot be self-assigned"));
    }

    let email = payload.email.trim().to_lowercase();
    let exists = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(user.id),
            "user_signup",
            "users",
            json!({ "user_id": user.id, "role": role }),
        ),
    )
    .await;

    Ok(user_from_entity(user))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<LoginResponse> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Incorrect email or password".into()));
    }
    if !user.active {
        return Err(AppError::Unauthorized("This account has been deactivated".into()));
    }

    let token = issue_token(&state.config, user.id, user.role)?;

    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(user.id),
            "user_login",
            "users",
            json!({ "user_id": user.id }),
        ),
    )
    .await;

    Ok(LoginResponse {
        token,
        user: user_from_entity(user),
    })
}

/// The token's user, provided the account still exists and is active.
pub(crate) async fn active_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<users::Model> {
    let user = Users::find_by_id(user_id).one(conn).await?.ok_or_else(|| {
        AppError::Unauthorized("The user belonging to this token no longer exists".into())
    })?;
    if !user.active {
        return Err(AppError::Unauthorized("This account has been deactivated".into()));
    }
    Ok(user)
}

pub async fn me(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    active_user(&state.orm, auth.user_id).await.map(user_from_entity)
}

/// Checks the current password, stores the new hash and issues a fresh token.
pub async fn update_password(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdatePasswordRequest,
) -> AppResult<LoginResponse> {
    payload.validate()?;
    let user = active_user(&state.orm, auth.user_id).await?;
    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Your current password is wrong".into()));
    }

    let now = Utc::now();
    let mut model: users::ActiveModel = user.into();
    model.password_hash = Set(hash_password(&payload.new_password)?);
    model.password_changed_at = Set(Some(now.into()));
    model.updated_at = Set(now.into());
    let user = model.update(&state.orm).await?;

    let token = issue_token(&state.config, user.id, user.role)?;
    audit::record(
        &state.orm,
        AuditEntry::new(
            Some(user.id),
            "password_update",
            "users",
            json!({ "user_id": user.id }),
        ),
    )
    .await;

    Ok(LoginResponse {
        token,
        user: user_from_entity(user),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }
}
