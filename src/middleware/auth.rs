use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::{AppError, AppResult},
    models::Role,
    state::AppState,
};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Like [`AuthUser`] but never rejects; a missing or bad token yields `None`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

pub fn ensure_role(user: &AuthUser, role: Role) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::forbidden(
            "You do not have permission to perform this action",
        ));
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, Role::Admin)
}

/// Passes for the resource owner and for admins.
pub fn ensure_owner_or_admin(owner_id: Uuid, user: &AuthUser) -> AppResult<()> {
    if user.user_id == owner_id || user.is_admin() {
        return Ok(());
    }
    Err(AppError::forbidden(
        "You do not have permission to access this resource",
    ))
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

/// Bearer header first, then the `token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Unauthorized("You are not logged in. Please log in to get access.".into())
        })?;
        decode_token(&token, &state.config.jwt_secret)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = token_from_headers(&parts.headers)
            .and_then(|token| decode_token(&token, &state.config.jwt_secret).ok());
        Ok(MaybeAuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_for(user_id: Uuid, role: Role, secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn decodes_valid_token() {
        let id = Uuid::new_v4();
        let token = token_for(id, Role::RestaurantOwner, "secret", far_future());
        let user = decode_token(&token, "secret").unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, Role::RestaurantOwner);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let id = Uuid::new_v4();
        let token = token_for(id, Role::Customer, "secret", far_future());
        assert!(matches!(
            decode_token(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));

        let expired = token_for(id, Role::Customer, "secret", 1);
        assert!(matches!(
            decode_token(&expired, "secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn reads_bearer_header_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));

        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn guards_return_forbidden() {
        let owner = Uuid::new_v4();
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };

        assert!(matches!(
            ensure_owner_or_admin(owner, &customer),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_owner_or_admin(owner, &admin).is_ok());
        assert!(ensure_owner_or_admin(customer.user_id, &customer).is_ok());
        assert!(matches!(ensure_admin(&customer), Err(AppError::Forbidden(_))));
        assert!(ensure_role(&customer, Role::Customer).is_ok());
    }
}
