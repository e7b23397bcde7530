use food_platform_api::{
    config::AppConfig,
    db::{DbPool, connect, run_migrations},
    models::Role,
    services::{auth_service::hash_password, restaurant_service::slugify},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let (pool, orm) = connect(&config.database_url, 2).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin1234", Role::Admin).await?;
    let owner_id = ensure_user(
        &pool,
        "Olivia Owner",
        "owner@example.com",
        "owner1234",
        Role::RestaurantOwner,
    )
    .await?;
    let customer_id = ensure_user(
        &pool,
        "Carl Customer",
        "customer@example.com",
        "customer1234",
        Role::Customer,
    )
    .await?;
    let restaurant_id = seed_restaurant(&pool, owner_id).await?;

    println!(
        "Seed completed. Admin: {admin_id}, owner: {owner_id}, customer: {customer_id}, restaurant: {restaurant_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let role_name = match role {
        Role::Customer => "customer",
        Role::RestaurantOwner => "restaurant_owner",
        Role::Admin => "admin",
    };

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role_name)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role_name})");
    Ok(id)
}

async fn seed_restaurant(pool: &DbPool, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let name = "Ferris Kitchen";
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM restaurants WHERE owner_id = $1 AND name = $2")
            .bind(owner_id)
            .bind(name)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        println!("Restaurant {name} already present");
        return Ok(id);
    }

    let restaurant_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO restaurants
            (id, owner_id, name, slug, description, cuisine, phone, email, address, delivery_fee, minimum_order)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(restaurant_id)
    .bind(owner_id)
    .bind(name)
    .bind(slugify(name))
    .bind("Crab cakes and other crustacean comfort food")
    .bind("seafood")
    .bind("+1 555 0100")
    .bind("kitchen@example.com")
    .bind("1 Harbour Road, Portsmouth")
    .bind(299_i64)
    .bind(1000_i64)
    .execute(pool)
    .await?;

    let menu = [
        ("Crab Cake", "Two crispy crab cakes", 1250_i64, "Mains"),
        ("Lobster Roll", "Buttered brioche, lemon mayo", 1800, "Mains"),
        ("Chips", "Hand-cut, sea salt", 450, "Sides"),
        ("Lemonade", "Fresh and cold", 300, "Drinks"),
    ];
    for (item, description, price, category) in menu {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, restaurant_id, name, description, price, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(restaurant_id)
        .bind(item)
        .bind(description)
        .bind(price)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded restaurant {name} with {} menu items", menu.len());
    Ok(restaurant_id)
}
