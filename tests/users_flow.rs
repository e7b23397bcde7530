use food_platform_api::{
    dto::{
        auth::{LoginRequest, SignupRequest, UpdatePasswordRequest},
        users::{AdminUpdateUserRequest, UpdateMeRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Role, User},
    routes::params::UserQuery,
    services::{auth_service, user_service},
    state::AppState,
};
use uuid::Uuid;

mod common;

const PASSWORD: &str = "first-password";

async fn signup(state: &AppState) -> anyhow::Result<(User, AuthUser)> {
    let user = auth_service::signup(
        state,
        SignupRequest {
            name: "Jamie Doe".into(),
            email: format!("{}@Example.test", Uuid::new_v4().simple()),
            password: PASSWORD.into(),
            role: None,
        },
    )
    .await?;
    let auth = AuthUser {
        user_id: user.id,
        role: user.role,
    };
    Ok((user, auth))
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn profile_updates_only_touch_name_and_email() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let (_, auth) = signup(&state).await?;
    let (taken, _) = signup(&state).await?;

    let new_email = format!("{}@EXAMPLE.test", Uuid::new_v4().simple());
    let updated = user_service::update_me(
        &state,
        &auth,
        UpdateMeRequest {
            name: Some("  Jamie Roe ".into()),
            email: Some(new_email.clone()),
        },
    )
    .await?;
    assert_eq!(updated.name, "Jamie Roe");
    assert_eq!(updated.email, new_email.to_lowercase());
    assert_eq!(updated.role, Role::Customer);

    let clash = user_service::update_me(
        &state,
        &auth,
        UpdateMeRequest {
            email: Some(taken.email.clone()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    let invalid = user_service::update_me(
        &state,
        &auth,
        UpdateMeRequest {
            email: Some("nope".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn deactivated_accounts_cannot_log_in() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let (user, auth) = signup(&state).await?;

    auth_service::login(&state, login(&user.email, PASSWORD)).await?;
    user_service::deactivate_me(&state, &auth).await?;

    let refused = auth_service::login(&state, login(&user.email, PASSWORD)).await;
    assert!(matches!(refused, Err(AppError::Unauthorized(_))));
    let me = auth_service::me(&state, &auth).await;
    assert!(matches!(me, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn password_change_replaces_the_old_password() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let (user, auth) = signup(&state).await?;

    let wrong = auth_service::update_password(
        &state,
        &auth,
        UpdatePasswordRequest {
            current_password: "not-my-password".into(),
            new_password: "second-password".into(),
            new_password_confirm: "second-password".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

    let changed = auth_service::update_password(
        &state,
        &auth,
        UpdatePasswordRequest {
            current_password: PASSWORD.into(),
            new_password: "second-password".into(),
            new_password_confirm: "second-password".into(),
        },
    )
    .await?;
    assert!(!changed.token.is_empty());

    let old = auth_service::login(&state, login(&user.email, PASSWORD)).await;
    assert!(matches!(old, Err(AppError::Unauthorized(_))));
    auth_service::login(&state, login(&user.email, "second-password")).await?;
    Ok(())
}

#[tokio::test]
async fn user_management_is_admin_only() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let state = common::setup_state(&url).await?;
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;

    let denied = user_service::list_users(&state, &customer, UserQuery::default()).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    let denied = user_service::get_user(&state, &customer, admin.user_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    let denied = user_service::delete_user(&state, &customer, admin.user_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let (listed, meta) = user_service::list_users(
        &state,
        &admin,
        UserQuery {
            role: Some(Role::Admin),
            ..Default::default()
        },
    )
    .await?;
    assert!(listed.iter().all(|u| u.role == Role::Admin));
    assert!(meta.total.is_some_and(|total| total >= 1));

    let promoted = user_service::update_user(
        &state,
        &admin,
        customer.user_id,
        AdminUpdateUserRequest {
            role: Some(Role::RestaurantOwner),
            active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(promoted.role, Role::RestaurantOwner);
    assert!(!promoted.active);

    user_service::delete_user(&state, &admin, customer.user_id).await?;
    let gone = user_service::get_user(&state, &admin, customer.user_id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    Ok(())
}
