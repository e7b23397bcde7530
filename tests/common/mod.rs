#![allow(dead_code)]

use std::time::Duration;

use food_platform_api::{
    config::{AppConfig, AppEnv},
    db::{connect, run_migrations},
    dto::{menu::CreateMenuItemRequest, restaurants::CreateRestaurantRequest},
    entity::users,
    middleware::auth::AuthUser,
    models::{MenuItem, Restaurant, Role},
    services::{menu_service, restaurant_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

/// `None` when no database is configured; callers skip.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            None
        }
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        db_max_connections: 5,
        host: "127.0.0.1".into(),
        port: 0,
        app_env: AppEnv::Development,
        jwt_secret: JWT_SECRET.into(),
        jwt_expires_in: Duration::from_secs(3600),
        cors_origins: vec!["*".into()],
        rate_limit_max: 1000,
        rate_limit_window: Duration::from_secs(60),
        notification_sweep_interval: Duration::from_secs(60),
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let (_pool, orm) = connect(database_url, 5).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, test_config(database_url)))
}

/// Inserts a user with a unique email so runs never collide.
pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    users::ActiveModel {
        id: Set(id),
        name: Set(format!("Test {}", &id.to_string()[..8])),
        email: Set(format!("{id}@example.test")),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser { user_id: id, role })
}

pub async fn create_restaurant(
    state: &AppState,
    owner: &AuthUser,
    delivery_fee: i64,
    minimum_order: i64,
) -> anyhow::Result<Restaurant> {
    let restaurant = restaurant_service::create_restaurant(
        state,
        owner,
        CreateRestaurantRequest {
            name: "Test Kitchen".into(),
            description: "Integration test restaurant".into(),
            cuisine: Some("test".into()),
            phone: "+1 555 0199".into(),
            email: "kitchen@example.test".into(),
            address: "1 Test Street".into(),
            delivery_fee: Some(delivery_fee),
            minimum_order: Some(minimum_order),
            is_open: Some(true),
        },
    )
    .await?;
    Ok(restaurant)
}

pub async fn create_menu_item(
    state: &AppState,
    owner: &AuthUser,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<MenuItem> {
    let item = menu_service::create_menu_item(
        state,
        owner,
        restaurant_id,
        CreateMenuItemRequest {
            name: name.into(),
            description: None,
            price,
            category: None,
            is_available: Some(true),
        },
    )
    .await?;
    Ok(item)
}
