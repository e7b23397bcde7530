use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, patch, post},
};

use crate::{
    config::AppConfig,
    dto::auth::{LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest},
    error::{AppError, AppResult},
    extract::Json,
    middleware::auth::{AuthUser, TOKEN_COOKIE},
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/update-password", patch(update_password))
}

fn token_cookie(config: &AppConfig, token: &str) -> AppResult<HeaderValue> {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        config.jwt_expires_in.as_secs()
    );
    if !config.is_development() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AppError::Internal(e.into()))
}

fn expired_cookie() -> AppResult<HeaderValue> {
    HeaderValue::from_str(&format!("{TOKEN_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"))
        .map_err(|e| AppError::Internal(e.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<User>),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation error")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = auth_service::signup(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; token also set as an HttpOnly cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = auth_service::login(&state, payload).await?;
    let cookie = token_cookie(&state.config, &resp.token)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::data(resp)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not logged in")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ApiResponse<User>>> {
    let me = auth_service::me(&state, &user).await?;
    Ok(Json(ApiResponse::data(me)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Token cookie cleared")),
    tag = "Auth"
)]
pub async fn logout() -> AppResult<impl IntoResponse> {
    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_cookie()?)]),
        Json(ApiResponse::data(())),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed; a fresh token is issued", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Current password is wrong"),
        (status = 422, description = "Validation error")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = auth_service::update_password(&state, &user, payload).await?;
    let cookie = token_cookie(&state.config, &resp.token)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ApiResponse::data(resp)),
    ))
}
